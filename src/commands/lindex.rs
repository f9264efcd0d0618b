use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the element at `index` in the list stored at `key`, or `nil` when the index is out of
/// range.
///
/// Ref: <https://redis.io/docs/latest/commands/lindex/>
#[derive(Debug, PartialEq)]
pub struct Lindex {
    pub key: String,
    pub index: i64,
}

impl Executable for Lindex {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let value = store.lock().lindex(&self.key, self.index)?;
        Ok(value.map(Frame::Bulk).unwrap_or(Frame::Null))
    }
}

impl TryFrom<&mut CommandParser> for Lindex {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let index = parser.next_integer()?;

        Ok(Self { key, index })
    }
}
