use itertools::Itertools;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Adds all the specified members with the specified scores to the sorted set stored at `key`,
/// updating the score of members that already exist. Replies the number of new members.
///
/// Ref: <https://redis.io/docs/latest/commands/zadd/>
#[derive(Debug, PartialEq)]
pub struct Zadd {
    pub key: String,
    pub members: Vec<(f64, String)>,
}

impl Executable for Zadd {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let added = store.lock().zadd(&self.key, self.members)?;
        Ok(Frame::Integer(added as i64))
    }
}

impl TryFrom<&mut CommandParser> for Zadd {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        if parser.remaining() == 0 || parser.remaining() % 2 != 0 {
            return Err(CommandParserError::EndOfStream);
        }

        let members = parser
            .remaining_strings()?
            .into_iter()
            .tuples()
            .map(|(score, member)| -> Result<_, CommandParserError> {
                let score = score
                    .parse::<f64>()
                    .map_err(|_| CommandParserError::NotAFloat)?;
                if score.is_nan() {
                    return Err(CommandParserError::NotAFloat);
                }
                Ok((score, member))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { key, members })
    }
}
