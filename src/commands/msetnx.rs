use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::mset::parse_pairs;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Sets the given keys to their respective values, but only if none of them exists. Replies 1
/// when every key was set and 0 when nothing was.
///
/// Ref: <https://redis.io/docs/latest/commands/msetnx/>
#[derive(Debug, PartialEq)]
pub struct Msetnx {
    pub pairs: Vec<(String, Bytes)>,
}

impl Executable for Msetnx {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut state = store.lock();

        if self.pairs.iter().any(|(key, _)| state.exists(key)) {
            return Ok(Frame::Integer(0));
        }

        for (key, value) in self.pairs {
            state.set(key, value);
        }
        Ok(Frame::Integer(1))
    }
}

impl TryFrom<&mut CommandParser> for Msetnx {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self {
            pairs: parse_pairs(parser)?,
        })
    }
}
