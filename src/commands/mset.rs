use bytes::Bytes;
use itertools::Itertools;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Sets the given keys to their respective values, replacing existing values.
///
/// Ref: <https://redis.io/docs/latest/commands/mset/>
#[derive(Debug, PartialEq)]
pub struct Mset {
    pub pairs: Vec<(String, Bytes)>,
}

impl Executable for Mset {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut state = store.lock();
        for (key, value) in self.pairs {
            state.set(key, value);
        }

        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Mset {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self {
            pairs: parse_pairs(parser)?,
        })
    }
}

/// Reads the `key value [key value ...]` tail shared by `MSET` and `MSETNX`.
pub(crate) fn parse_pairs(
    parser: &mut CommandParser,
) -> Result<Vec<(String, Bytes)>, CommandParserError> {
    if parser.remaining() % 2 != 0 {
        return Err(CommandParserError::EndOfStream);
    }

    parser
        .remaining_bytes()?
        .into_iter()
        .tuples()
        .map(|(key, value)| -> Result<_, CommandParserError> {
            let key = std::str::from_utf8(&key)?.to_string();
            Ok((key, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    #[test]
    fn multiple_pairs() {
        let frame = Frame::command(["MSET", "a", "1", "b", "2"]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Mset(Mset {
                pairs: vec![
                    (String::from("a"), Bytes::from("1")),
                    (String::from("b"), Bytes::from("2")),
                ]
            })
        );

        let store = Store::new();
        let res = cmd.exec(store.clone()).unwrap();

        assert_eq!(res, Frame::Simple("OK".to_string()));
        assert_eq!(store.lock().get("a"), Ok(Bytes::from("1")));
        assert_eq!(store.lock().get("b"), Ok(Bytes::from("2")));
    }

    #[test]
    fn odd_number_of_arguments() {
        let frame = Frame::command(["MSET", "a", "1", "b"]);
        let err = Command::try_from(frame).unwrap_err();

        assert_eq!(
            err,
            CommandParserError::WrongNumberOfArguments {
                command: "mset".to_string()
            }
        );

        let frame = Frame::command(["MSET"]);
        assert!(Command::try_from(frame).is_err());
    }
}
