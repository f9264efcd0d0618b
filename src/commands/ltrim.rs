use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Trim the list stored at `key` so that it only contains the elements between `start` and
/// `stop`, both inclusive. A range with no elements empties, and therefore deletes, the list.
///
/// Ref: <https://redis.io/docs/latest/commands/ltrim/>
#[derive(Debug, PartialEq)]
pub struct Ltrim {
    pub key: String,
    pub start: i64,
    pub stop: i64,
}

impl Executable for Ltrim {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        store.lock().ltrim(&self.key, self.start, self.stop)?;
        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Ltrim {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let start = parser.next_integer()?;
        let stop = parser.next_integer()?;

        Ok(Self { key, start, stop })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use bytes::Bytes;

    #[test]
    fn keeps_range() {
        let store = Store::new();
        store
            .lock()
            .rpush("l", ["a", "b", "c", "d"].map(Bytes::from).to_vec())
            .unwrap();

        let cmd = Command::try_from(Frame::command(["LTRIM", "l", "1", "-2"])).unwrap();
        assert_eq!(
            cmd.exec(store.clone()).unwrap(),
            Frame::Simple("OK".to_string())
        );
        assert_eq!(
            store.lock().lrange("l", 0, -1),
            Ok(["b", "c"].map(Bytes::from).to_vec())
        );
    }

    #[test]
    fn empty_range_deletes_key() {
        let store = Store::new();
        store.lock().rpush("l", vec![Bytes::from("a")]).unwrap();

        let cmd = Command::try_from(Frame::command(["LTRIM", "l", "5", "10"])).unwrap();
        cmd.exec(store.clone()).unwrap();

        assert!(!store.lock().exists("l"));
    }
}
