use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns PONG if no argument is provided, otherwise returns a copy of the argument as a bulk.
///
/// Ref: <https://redis.io/docs/latest/commands/ping/>
#[derive(Debug, PartialEq)]
pub struct Ping {
    pub message: Option<Bytes>,
}

impl Executable for Ping {
    fn exec(self, _store: Store) -> Result<Frame, Error> {
        let res = match self.message {
            Some(msg) => Frame::Bulk(msg),
            None => Frame::Simple("PONG".to_string()),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Ping {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let message = match parser.next_bytes() {
            Ok(msg) => Some(msg),
            Err(CommandParserError::EndOfStream) => None,
            Err(err) => return Err(err),
        };

        Ok(Self { message })
    }
}
