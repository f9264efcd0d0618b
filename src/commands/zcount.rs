use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::types::ScoreBorder;
use crate::Error;

/// Returns the number of members in the sorted set stored at `key` with a score between `min`
/// and `max`.
///
/// Ref: <https://redis.io/docs/latest/commands/zcount/>
#[derive(Debug, PartialEq)]
pub struct Zcount {
    pub key: String,
    pub min: ScoreBorder,
    pub max: ScoreBorder,
}

impl Executable for Zcount {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let count = store.lock().zcount(&self.key, &self.min, &self.max)?;
        Ok(Frame::Integer(count as i64))
    }
}

impl TryFrom<&mut CommandParser> for Zcount {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let min = parser.next_border()?;
        let max = parser.next_border()?;

        Ok(Self { key, min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    #[test]
    fn counts_in_range() {
        let store = Store::new();
        let members = (1..=5)
            .map(|i| (i as f64, format!("m{i}")))
            .collect::<Vec<_>>();
        store.lock().zadd("z", members).unwrap();

        let cmd = Command::try_from(Frame::command(["ZCOUNT", "z", "(1", "3"])).unwrap();
        assert_eq!(
            cmd,
            Command::Zcount(Zcount {
                key: String::from("z"),
                min: ScoreBorder::exclusive(1.0),
                max: ScoreBorder::inclusive(3.0),
            })
        );
        assert_eq!(cmd.exec(store.clone()).unwrap(), Frame::Integer(2));

        let cmd = Command::try_from(Frame::command(["ZCOUNT", "z", "-inf", "+inf"])).unwrap();
        assert_eq!(cmd.exec(store.clone()).unwrap(), Frame::Integer(5));
    }
}
