use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the 0-based rank of `member` in the sorted set stored at `key`, by ascending score or,
/// for `ZREVRANK`, by descending score. Replies `nil` if the member or the key does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/zrank/>
#[derive(Debug, PartialEq)]
pub struct Zrank {
    pub key: String,
    pub member: String,
    pub rev: bool,
}

impl Executable for Zrank {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let rank = store.lock().zrank(&self.key, &self.member, self.rev)?;
        Ok(rank
            .map(|rank| Frame::Integer(rank as i64))
            .unwrap_or(Frame::Null))
    }
}

impl Zrank {
    pub(crate) fn parse(parser: &mut CommandParser, rev: bool) -> Result<Self, CommandParserError> {
        let key = parser.next_string()?;
        let member = parser.next_string()?;

        Ok(Self { key, member, rev })
    }
}
