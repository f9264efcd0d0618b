use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Sets the list element at `index` to `value`.
///
/// Ref: <https://redis.io/docs/latest/commands/lset/>
#[derive(Debug, PartialEq)]
pub struct Lset {
    pub key: String,
    pub index: i64,
    pub value: Bytes,
}

impl Executable for Lset {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        store.lock().lset(&self.key, self.index, self.value)?;
        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Lset {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let index = parser.next_integer()?;
        let value = parser.next_bytes()?;

        Ok(Self { key, index, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    #[test]
    fn set_and_errors() {
        let store = Store::new();
        store
            .lock()
            .rpush("l", vec![Bytes::from("a"), Bytes::from("b")])
            .unwrap();

        let cmd = Command::try_from(Frame::command(["LSET", "l", "-1", "z"])).unwrap();
        assert_eq!(
            cmd.exec(store.clone()).unwrap(),
            Frame::Simple("OK".to_string())
        );
        assert_eq!(store.lock().lindex("l", 1), Ok(Some(Bytes::from("z"))));

        let cmd = Command::try_from(Frame::command(["LSET", "l", "5", "z"])).unwrap();
        let err = cmd.exec(store.clone()).unwrap_err();
        assert_eq!(err.to_string(), "ERR index out of range");

        let cmd = Command::try_from(Frame::command(["LSET", "missing", "0", "z"])).unwrap();
        let err = cmd.exec(store.clone()).unwrap_err();
        assert_eq!(err.to_string(), "ERR no such key");
    }
}
