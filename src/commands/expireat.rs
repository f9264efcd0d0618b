use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::ttl::Ttl;
use crate::Error;

/// Like `EXPIRE`, but the deadline is an absolute Unix timestamp in seconds. A timestamp in the
/// past deletes the key right away.
///
/// Ref: <https://redis.io/docs/latest/commands/expireat/>
#[derive(Debug, PartialEq)]
pub struct Expireat {
    pub key: String,
    pub timestamp: i64,
}

impl Executable for Expireat {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let ttl = Ttl::at_unix_seconds(self.timestamp);
        let updated = store.lock().set_deadline(&self.key, ttl);

        Ok(Frame::Integer(updated as i64))
    }
}

impl TryFrom<&mut CommandParser> for Expireat {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let timestamp = parser.next_integer()?;

        Ok(Self { key, timestamp })
    }
}
