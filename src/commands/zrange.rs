use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::types::Element;
use crate::Error;

/// Returns the members of the sorted set stored at `key` whose 0-based rank lies between `start`
/// and `stop`, both inclusive, lowest score first. `ZREVRANGE` parses into the same command with
/// `rev` set and ranks from the highest score.
///
/// Ref: <https://redis.io/docs/latest/commands/zrange/>
#[derive(Debug, PartialEq)]
pub struct Zrange {
    pub key: String,
    pub start: i64,
    pub stop: i64,
    pub with_scores: bool,
    pub rev: bool,
}

impl Executable for Zrange {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let elements = store
            .lock()
            .zrange(&self.key, self.start, self.stop, self.rev)?;

        Ok(elements_to_frame(elements, self.with_scores))
    }
}

impl Zrange {
    pub(crate) fn parse(parser: &mut CommandParser, rev: bool) -> Result<Self, CommandParserError> {
        let key = parser.next_string()?;
        let start = parser.next_integer()?;
        let stop = parser.next_integer()?;

        let with_scores = match parser.remaining() {
            0 => false,
            _ => {
                let option = parser.next_string()?;
                if !option.eq_ignore_ascii_case("withscores") {
                    return Err(CommandParserError::InvalidCommandArgument {
                        command: "ZRANGE".to_string(),
                        argument: option,
                    });
                }
                true
            }
        };

        Ok(Self {
            key,
            start,
            stop,
            with_scores,
            rev,
        })
    }
}

/// Flattens elements into `[member, member, ...]`, or `[member, score, member, score, ...]`
/// when scores are requested.
pub(crate) fn elements_to_frame(elements: Vec<Element>, with_scores: bool) -> Frame {
    let mut frames = Vec::with_capacity(elements.len() * if with_scores { 2 } else { 1 });
    for element in elements {
        frames.push(Frame::Bulk(Bytes::from(element.member)));
        if with_scores {
            frames.push(Frame::Bulk(Bytes::from(format_score(element.score))));
        }
    }
    Frame::Array(frames)
}

/// Plain decimal form that parses back to the same score: `1`, `1.5`, `inf`. Never uses an
/// exponent, so very large or very small scores come out long.
pub(crate) fn format_score(score: f64) -> String {
    score.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    fn store_with_zset() -> Store {
        let store = Store::new();
        store
            .lock()
            .zadd(
                "z",
                vec![
                    (1.0, String::from("a")),
                    (2.0, String::from("b")),
                    (3.5, String::from("c")),
                ],
            )
            .unwrap();
        store
    }

    fn bulks(values: &[&'static str]) -> Frame {
        Frame::Array(values.iter().map(|v| Frame::Bulk(Bytes::from(*v))).collect())
    }

    #[test]
    fn with_scores() {
        let store = store_with_zset();

        let cmd = Command::try_from(Frame::command(["ZRANGE", "z", "0", "-1", "withscores"])).unwrap();
        assert_eq!(
            cmd,
            Command::Zrange(Zrange {
                key: String::from("z"),
                start: 0,
                stop: -1,
                with_scores: true,
                rev: false,
            })
        );
        assert_eq!(
            cmd.exec(store.clone()).unwrap(),
            bulks(&["a", "1", "b", "2", "c", "3.5"])
        );
    }

    #[test]
    fn reverse() {
        let store = store_with_zset();

        let cmd = Command::try_from(Frame::command(["ZREVRANGE", "z", "0", "1"])).unwrap();
        assert_eq!(cmd.exec(store.clone()).unwrap(), bulks(&["c", "b"]));
    }

    #[test]
    fn missing_key() {
        let cmd = Command::try_from(Frame::command(["ZRANGE", "z", "0", "-1"])).unwrap();

        assert_eq!(cmd.exec(Store::new()).unwrap(), Frame::Array(vec![]));
    }

    #[test]
    fn invalid_option() {
        let frame = Frame::command(["ZRANGE", "z", "0", "-1", "WITHOUTSCORES"]);

        assert_eq!(
            Command::try_from(frame),
            Err(CommandParserError::InvalidCommandArgument {
                command: "ZRANGE".to_string(),
                argument: "WITHOUTSCORES".to_string()
            })
        );
    }

    #[test]
    fn scores_format() {
        assert_eq!(format_score(1.0), "1");
        assert_eq!(format_score(-2.25), "-2.25");
        assert_eq!(format_score(f64::INFINITY), "inf");
        assert_eq!(format_score(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_score(1e22), "10000000000000000000000");
    }
}
