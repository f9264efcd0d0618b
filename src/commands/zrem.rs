use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Removes the specified members from the sorted set stored at `key`. Replies the number of
/// members actually removed.
///
/// Ref: <https://redis.io/docs/latest/commands/zrem/>
#[derive(Debug, PartialEq)]
pub struct Zrem {
    pub key: String,
    pub members: Vec<String>,
}

impl Executable for Zrem {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let removed = store.lock().zrem(&self.key, &self.members)?;
        Ok(Frame::Integer(removed as i64))
    }
}

impl TryFrom<&mut CommandParser> for Zrem {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let members = parser.remaining_strings()?;

        Ok(Self { key, members })
    }
}
