use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Removes occurrences of `value` from the list stored at `key`: the first `count` from the head
/// when `count` is positive, the first `|count|` from the tail when negative, every one when 0.
/// Replies the number of removed elements.
///
/// Ref: <https://redis.io/docs/latest/commands/lrem/>
#[derive(Debug, PartialEq)]
pub struct Lrem {
    pub key: String,
    pub count: i64,
    pub value: Bytes,
}

impl Executable for Lrem {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let removed = store.lock().lrem(&self.key, self.count, &self.value)?;
        Ok(Frame::Integer(removed as i64))
    }
}

impl TryFrom<&mut CommandParser> for Lrem {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let count = parser.next_integer()?;
        let value = parser.next_bytes()?;

        Ok(Self { key, count, value })
    }
}
