use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::{Store, StoreError};
use crate::Error;

/// Get the value of `key`. If the key does not exist the special value `nil` is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/get/>
#[derive(Debug, PartialEq)]
pub struct Get {
    pub key: String,
}

impl Executable for Get {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut state = store.lock();

        match state.get(&self.key) {
            Ok(value) => Ok(Frame::Bulk(value)),
            Err(StoreError::KeyNotExists) => Ok(Frame::Null),
            Err(StoreError::KeyExpired) => {
                state.remove(&self.key);
                Ok(Frame::Null)
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl TryFrom<&mut CommandParser> for Get {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}
