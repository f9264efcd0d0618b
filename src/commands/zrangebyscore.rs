use strum_macros::EnumString;

use crate::commands::executable::Executable;
use crate::commands::zrange::elements_to_frame;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::types::ScoreBorder;
use crate::Error;

/// Returns the members of the sorted set stored at `key` with a score between `min` and `max`,
/// lowest score first. `ZREVRANGEBYSCORE` takes `max` before `min` and walks from the highest
/// score. `LIMIT offset count` skips `offset` matches and returns at most `count`; a negative
/// count means no limit.
///
/// Ref: <https://redis.io/docs/latest/commands/zrangebyscore/>
#[derive(Debug, PartialEq)]
pub struct Zrangebyscore {
    pub key: String,
    pub min: ScoreBorder,
    pub max: ScoreBorder,
    pub with_scores: bool,
    pub limit: Option<(i64, i64)>,
    pub rev: bool,
}

#[derive(Debug, PartialEq, EnumString)]
#[strum(ascii_case_insensitive)]
enum RangeOption {
    Withscores,
    Limit,
}

impl Executable for Zrangebyscore {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let (offset, count) = self.limit.unwrap_or((0, -1));
        let elements = store.lock().zrange_by_score(
            &self.key, &self.min, &self.max, offset, count, self.rev,
        )?;

        Ok(elements_to_frame(elements, self.with_scores))
    }
}

impl Zrangebyscore {
    pub(crate) fn parse(parser: &mut CommandParser, rev: bool) -> Result<Self, CommandParserError> {
        let key = parser.next_string()?;
        let (min, max) = if rev {
            let max = parser.next_border()?;
            (parser.next_border()?, max)
        } else {
            let min = parser.next_border()?;
            (min, parser.next_border()?)
        };

        let mut with_scores = false;
        let mut limit = None;
        while parser.remaining() > 0 {
            let option = parser.next_string()?;
            match option.parse::<RangeOption>() {
                Ok(RangeOption::Withscores) => with_scores = true,
                Ok(RangeOption::Limit) => {
                    let offset = parser.next_integer()?;
                    let count = parser.next_integer()?;
                    limit = Some((offset, count));
                }
                Err(_) => {
                    return Err(CommandParserError::InvalidCommandArgument {
                        command: "ZRANGEBYSCORE".to_string(),
                        argument: option,
                    })
                }
            }
        }

        Ok(Self {
            key,
            min,
            max,
            with_scores,
            limit,
            rev,
        })
    }
}
