use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Insert all the specified values at the head of the list stored at `key`, creating the list if
/// needed. Values are inserted one after the other, so `LPUSH l a b c` leaves `c` first. Replies
/// the length of the list after the push.
///
/// Ref: <https://redis.io/docs/latest/commands/lpush/>
#[derive(Debug, PartialEq)]
pub struct Lpush {
    pub key: String,
    pub values: Vec<Bytes>,
}

impl Executable for Lpush {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let len = store.lock().lpush(&self.key, self.values)?;
        Ok(Frame::Integer(len as i64))
    }
}

impl TryFrom<&mut CommandParser> for Lpush {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let values = parser.remaining_bytes()?;

        Ok(Self { key, values })
    }
}
