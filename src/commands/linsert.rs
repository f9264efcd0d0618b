use bytes::Bytes;
use strum_macros::EnumString;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Inserts `value` in the list stored at `key` either before or after the first occurrence of
/// `pivot`. Replies the new length, -1 when the pivot was not found and 0 when the key does not
/// exist.
///
/// Ref: <https://redis.io/docs/latest/commands/linsert/>
#[derive(Debug, PartialEq)]
pub struct Linsert {
    pub key: String,
    pub position: Position,
    pub pivot: Bytes,
    pub value: Bytes,
}

#[derive(Debug, PartialEq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Position {
    Before,
    After,
}

impl Executable for Linsert {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let before = self.position == Position::Before;
        let len = store
            .lock()
            .linsert(&self.key, before, &self.pivot, self.value)?;

        Ok(Frame::Integer(len))
    }
}

impl TryFrom<&mut CommandParser> for Linsert {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let position = parser.next_string()?;
        let position = position
            .parse::<Position>()
            .map_err(|_| CommandParserError::InvalidCommandArgument {
                command: "LINSERT".to_string(),
                argument: position,
            })?;
        let pivot = parser.next_bytes()?;
        let value = parser.next_bytes()?;

        Ok(Self {
            key,
            position,
            pivot,
            value,
        })
    }
}
