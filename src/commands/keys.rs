use bytes::Bytes;
use glob_match::glob_match;
use itertools::Itertools;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns all keys matching `pattern`, sorted.
///
/// Ref: <https://redis.io/docs/latest/commands/keys/>
#[derive(Debug, PartialEq)]
pub struct Keys {
    pub pattern: String,
}

impl Executable for Keys {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let state = store.lock();

        let keys = state
            .keys()
            .filter(|key| glob_match(&self.pattern, key))
            .sorted()
            .map(|key| Frame::Bulk(Bytes::from(key.to_string())))
            .collect();

        Ok(Frame::Array(keys))
    }
}

impl TryFrom<&mut CommandParser> for Keys {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let pattern = parser.next_string()?;
        Ok(Self { pattern })
    }
}
