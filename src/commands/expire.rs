use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Set a timeout on `key`, in seconds. After the timeout has expired, the key will automatically
/// be deleted. A non-positive timeout deletes the key right away. Replies 1 if the timeout was
/// set and 0 if the key does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/expire/>
#[derive(Debug, PartialEq)]
pub struct Expire {
    pub key: String,
    pub seconds: i64,
}

impl Executable for Expire {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let updated = store.lock().set_ttl(&self.key, self.seconds);

        Ok(Frame::Integer(updated as i64))
    }
}

impl TryFrom<&mut CommandParser> for Expire {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let seconds = parser.next_integer()?;

        Ok(Self { key, seconds })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{execute, Command};
    use bytes::Bytes;

    #[test]
    fn existing_key() {
        let store = Store::new();
        store.lock().set(String::from("key1"), Bytes::from("1"));

        let frame = Frame::command(["EXPIRE", "key1", "100"]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Expire(Expire {
                key: String::from("key1"),
                seconds: 100,
            })
        );

        let res = cmd.exec(store.clone()).unwrap();

        assert_eq!(res, Frame::Integer(1));
        assert!((99..=100).contains(&store.lock().remaining_life("key1")));
    }

    #[test]
    fn missing_key() {
        let store = Store::new();

        let cmd = Command::try_from(Frame::command(["EXPIRE", "key1", "100"])).unwrap();
        let res = cmd.exec(store.clone()).unwrap();

        assert_eq!(res, Frame::Integer(0));
    }

    #[test]
    fn zero_expires_immediately() {
        let store = Store::new();
        store.lock().set(String::from("key1"), Bytes::from("1"));

        let cmd = Command::try_from(Frame::command(["EXPIRE", "key1", "0"])).unwrap();
        let res = cmd.exec(store.clone()).unwrap();

        assert_eq!(res, Frame::Integer(1));
        assert!(!store.lock().exists("key1"));
    }

    #[test]
    fn huge_seconds_keep_the_key() {
        let store = Store::new();
        store.lock().set(String::from("key1"), Bytes::from("1"));

        let res = execute(Frame::command(["EXPIRE", "key1", "9223372036854775807"]), &store);
        assert_eq!(res, Frame::Integer(1));

        let res = execute(Frame::command(["GET", "key1"]), &store);
        assert_eq!(res, Frame::Bulk(Bytes::from("1")));
        assert!(store.lock().remaining_life("key1") > 0);
    }

    #[test]
    fn invalid_seconds() {
        let frame = Frame::command(["EXPIRE", "key1", "soon"]);

        assert_eq!(
            Command::try_from(frame),
            Err(CommandParserError::NotAnInteger)
        );
    }
}
