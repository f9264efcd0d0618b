use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::{Store, StoreError};
use crate::Error;

/// Returns the values of all specified keys. For every key that does not hold a string value or
/// does not exist, the special value `nil` is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/mget/>
#[derive(Debug, PartialEq)]
pub struct Mget {
    pub keys: Vec<String>,
}

impl Executable for Mget {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut state = store.lock();

        let values = self
            .keys
            .iter()
            .map(|key| match state.get(key) {
                Ok(value) => Frame::Bulk(value),
                Err(StoreError::KeyExpired) => {
                    state.remove(key);
                    Frame::Null
                }
                Err(_) => Frame::Null,
            })
            .collect::<Vec<_>>();

        Ok(Frame::Array(values))
    }
}

impl TryFrom<&mut CommandParser> for Mget {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let keys = parser.remaining_strings()?;
        Ok(Self { keys })
    }
}
