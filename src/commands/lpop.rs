use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Removes and returns elements from the head of the list stored at `key`. Without `count` the
/// reply is a single element or `nil`; with `count` it is an array of up to `count` elements.
///
/// Ref: <https://redis.io/docs/latest/commands/lpop/>
#[derive(Debug, PartialEq)]
pub struct Lpop {
    pub key: String,
    pub count: Option<usize>,
}

impl Executable for Lpop {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut state = store.lock();

        match self.count {
            None => {
                let value = state.lpop(&self.key, 1)?.pop();
                Ok(value.map(Frame::Bulk).unwrap_or(Frame::Null))
            }
            Some(_) if !state.exists(&self.key) => Ok(Frame::Null),
            Some(count) => {
                let values = state.lpop(&self.key, count)?;
                Ok(Frame::Array(values.into_iter().map(Frame::Bulk).collect()))
            }
        }
    }
}

impl TryFrom<&mut CommandParser> for Lpop {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let count = match parser.remaining() {
            0 => None,
            _ => Some(parser.next_count()?),
        };

        Ok(Self { key, count })
    }
}
