pub mod del;
pub mod executable;
pub mod exists;
pub mod expire;
pub mod expireat;
pub mod get;
pub mod keys;
pub mod lindex;
pub mod linsert;
pub mod llen;
pub mod lpop;
pub mod lpush;
pub mod lrange;
pub mod lrem;
pub mod lset;
pub mod ltrim;
pub mod mget;
pub mod mset;
pub mod msetnx;
pub mod persist;
pub mod ping;
pub mod rpop;
pub mod rpush;
pub mod set;
pub mod ttl;
pub mod zadd;
pub mod zcard;
pub mod zcount;
pub mod zrange;
pub mod zrangebyscore;
pub mod zrank;
pub mod zrem;

use bytes::Bytes;
use std::{str, vec};
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::store::Store;
use crate::types::border::ParseScoreBorderError;
use crate::types::ScoreBorder;
use crate::Error;

use del::Del;
use exists::Exists;
use expire::Expire;
use expireat::Expireat;
use get::Get;
use keys::Keys;
use lindex::Lindex;
use linsert::Linsert;
use llen::Llen;
use lpop::Lpop;
use lpush::Lpush;
use lrange::Lrange;
use lrem::Lrem;
use lset::Lset;
use ltrim::Ltrim;
use mget::Mget;
use mset::Mset;
use msetnx::Msetnx;
use persist::Persist;
use ping::Ping;
use rpop::Rpop;
use rpush::Rpush;
use set::Set;
use ttl::Ttl;
use zadd::Zadd;
use zcard::Zcard;
use zcount::Zcount;
use zrange::Zrange;
use zrangebyscore::Zrangebyscore;
use zrank::Zrank;
use zrem::Zrem;

#[derive(Debug, PartialEq)]
pub enum Command {
    Del(Del),
    Exists(Exists),
    Expire(Expire),
    Expireat(Expireat),
    Get(Get),
    Keys(Keys),
    Mget(Mget),
    Mset(Mset),
    Msetnx(Msetnx),
    Persist(Persist),
    Set(Set),
    Ttl(Ttl),

    Lindex(Lindex),
    Linsert(Linsert),
    Llen(Llen),
    Lpop(Lpop),
    Lpush(Lpush),
    Lrange(Lrange),
    Lrem(Lrem),
    Lset(Lset),
    Ltrim(Ltrim),
    Rpop(Rpop),
    Rpush(Rpush),

    Zadd(Zadd),
    Zcard(Zcard),
    Zcount(Zcount),
    Zrange(Zrange),
    Zrangebyscore(Zrangebyscore),
    Zrank(Zrank),
    Zrem(Zrem),

    Ping(Ping),
}

impl Command {
    /// Whether the command may modify the keyspace, and therefore belongs in the append-only log.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Command::Del(_)
                | Command::Expire(_)
                | Command::Expireat(_)
                | Command::Mset(_)
                | Command::Msetnx(_)
                | Command::Persist(_)
                | Command::Set(_)
                | Command::Linsert(_)
                | Command::Lpop(_)
                | Command::Lpush(_)
                | Command::Lrem(_)
                | Command::Lset(_)
                | Command::Ltrim(_)
                | Command::Rpop(_)
                | Command::Rpush(_)
                | Command::Zadd(_)
                | Command::Zrem(_)
        )
    }

    /// The key that decides which node of a cluster owns the command. Commands spanning several
    /// keys are routed by the first one; `PING` and `KEYS` have none.
    pub fn key(&self) -> Option<&str> {
        let key = match self {
            Command::Del(cmd) => cmd.keys.first()?,
            Command::Exists(cmd) => cmd.keys.first()?,
            Command::Expire(cmd) => &cmd.key,
            Command::Expireat(cmd) => &cmd.key,
            Command::Get(cmd) => &cmd.key,
            Command::Mget(cmd) => cmd.keys.first()?,
            Command::Mset(cmd) => &cmd.pairs.first()?.0,
            Command::Msetnx(cmd) => &cmd.pairs.first()?.0,
            Command::Persist(cmd) => &cmd.key,
            Command::Set(cmd) => &cmd.key,
            Command::Ttl(cmd) => &cmd.key,
            Command::Lindex(cmd) => &cmd.key,
            Command::Linsert(cmd) => &cmd.key,
            Command::Llen(cmd) => &cmd.key,
            Command::Lpop(cmd) => &cmd.key,
            Command::Lpush(cmd) => &cmd.key,
            Command::Lrange(cmd) => &cmd.key,
            Command::Lrem(cmd) => &cmd.key,
            Command::Lset(cmd) => &cmd.key,
            Command::Ltrim(cmd) => &cmd.key,
            Command::Rpop(cmd) => &cmd.key,
            Command::Rpush(cmd) => &cmd.key,
            Command::Zadd(cmd) => &cmd.key,
            Command::Zcard(cmd) => &cmd.key,
            Command::Zcount(cmd) => &cmd.key,
            Command::Zrange(cmd) => &cmd.key,
            Command::Zrangebyscore(cmd) => &cmd.key,
            Command::Zrank(cmd) => &cmd.key,
            Command::Zrem(cmd) => &cmd.key,
            Command::Keys(_) | Command::Ping(_) => return None,
        };
        Some(key.as_str())
    }
}

impl Executable for Command {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        match self {
            Command::Del(cmd) => cmd.exec(store),
            Command::Exists(cmd) => cmd.exec(store),
            Command::Expire(cmd) => cmd.exec(store),
            Command::Expireat(cmd) => cmd.exec(store),
            Command::Get(cmd) => cmd.exec(store),
            Command::Keys(cmd) => cmd.exec(store),
            Command::Mget(cmd) => cmd.exec(store),
            Command::Mset(cmd) => cmd.exec(store),
            Command::Msetnx(cmd) => cmd.exec(store),
            Command::Persist(cmd) => cmd.exec(store),
            Command::Set(cmd) => cmd.exec(store),
            Command::Ttl(cmd) => cmd.exec(store),
            Command::Lindex(cmd) => cmd.exec(store),
            Command::Linsert(cmd) => cmd.exec(store),
            Command::Llen(cmd) => cmd.exec(store),
            Command::Lpop(cmd) => cmd.exec(store),
            Command::Lpush(cmd) => cmd.exec(store),
            Command::Lrange(cmd) => cmd.exec(store),
            Command::Lrem(cmd) => cmd.exec(store),
            Command::Lset(cmd) => cmd.exec(store),
            Command::Ltrim(cmd) => cmd.exec(store),
            Command::Rpop(cmd) => cmd.exec(store),
            Command::Rpush(cmd) => cmd.exec(store),
            Command::Zadd(cmd) => cmd.exec(store),
            Command::Zcard(cmd) => cmd.exec(store),
            Command::Zcount(cmd) => cmd.exec(store),
            Command::Zrange(cmd) => cmd.exec(store),
            Command::Zrangebyscore(cmd) => cmd.exec(store),
            Command::Zrank(cmd) => cmd.exec(store),
            Command::Zrem(cmd) => cmd.exec(store),
            Command::Ping(cmd) => cmd.exec(store),
        }
    }
}

impl TryFrom<Frame> for Command {
    type Error = CommandParserError;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands to the Redis server as RESP arrays.
        let frames = match frame {
            Frame::Array(array) => array,
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "array".to_string(),
                    actual: frame,
                })
            }
        };

        let mut parser = CommandParser {
            parts: frames.into_iter(),
        };

        let command_name = parser.parse_command_name()?;

        let command = match &command_name[..] {
            "del" => Del::try_from(&mut parser).map(Command::Del),
            "exists" => Exists::try_from(&mut parser).map(Command::Exists),
            "expire" => Expire::try_from(&mut parser).map(Command::Expire),
            "expireat" => Expireat::try_from(&mut parser).map(Command::Expireat),
            "get" => Get::try_from(&mut parser).map(Command::Get),
            "keys" => Keys::try_from(&mut parser).map(Command::Keys),
            "mget" => Mget::try_from(&mut parser).map(Command::Mget),
            "mset" => Mset::try_from(&mut parser).map(Command::Mset),
            "msetnx" => Msetnx::try_from(&mut parser).map(Command::Msetnx),
            "persist" => Persist::try_from(&mut parser).map(Command::Persist),
            "set" => Set::try_from(&mut parser).map(Command::Set),
            "ttl" => Ttl::try_from(&mut parser).map(Command::Ttl),
            "lindex" => Lindex::try_from(&mut parser).map(Command::Lindex),
            "linsert" => Linsert::try_from(&mut parser).map(Command::Linsert),
            "llen" => Llen::try_from(&mut parser).map(Command::Llen),
            "lpop" => Lpop::try_from(&mut parser).map(Command::Lpop),
            "lpush" => Lpush::try_from(&mut parser).map(Command::Lpush),
            "lrange" => Lrange::try_from(&mut parser).map(Command::Lrange),
            "lrem" => Lrem::try_from(&mut parser).map(Command::Lrem),
            "lset" => Lset::try_from(&mut parser).map(Command::Lset),
            "ltrim" => Ltrim::try_from(&mut parser).map(Command::Ltrim),
            "rpop" => Rpop::try_from(&mut parser).map(Command::Rpop),
            "rpush" => Rpush::try_from(&mut parser).map(Command::Rpush),
            "zadd" => Zadd::try_from(&mut parser).map(Command::Zadd),
            "zcard" => Zcard::try_from(&mut parser).map(Command::Zcard),
            "zcount" => Zcount::try_from(&mut parser).map(Command::Zcount),
            "zrange" => Zrange::parse(&mut parser, false).map(Command::Zrange),
            "zrevrange" => Zrange::parse(&mut parser, true).map(Command::Zrange),
            "zrangebyscore" => Zrangebyscore::parse(&mut parser, false).map(Command::Zrangebyscore),
            "zrevrangebyscore" => Zrangebyscore::parse(&mut parser, true).map(Command::Zrangebyscore),
            "zrank" => Zrank::parse(&mut parser, false).map(Command::Zrank),
            "zrevrank" => Zrank::parse(&mut parser, true).map(Command::Zrank),
            "zrem" => Zrem::try_from(&mut parser).map(Command::Zrem),
            "ping" => Ping::try_from(&mut parser).map(Command::Ping),
            _ => {
                return Err(CommandParserError::UnknownCommand {
                    command: command_name,
                })
            }
        };

        // Running out of arguments, or having some left over, both mean the arity is wrong.
        match command {
            Ok(command) if parser.remaining() == 0 => Ok(command),
            Ok(_) | Err(CommandParserError::EndOfStream) => {
                Err(CommandParserError::WrongNumberOfArguments {
                    command: command_name,
                })
            }
            Err(err) => Err(err),
        }
    }
}

/// Decodes `frame` into a command and runs it against `store`, turning every failure into an
/// error reply.
pub fn execute(frame: Frame, store: &Store) -> Frame {
    match Command::try_from(frame) {
        Ok(command) => command
            .exec(store.clone())
            .unwrap_or_else(|err| Frame::Error(err.to_string())),
        Err(err) => Frame::Error(format!("ERR {}", err)),
    }
}

pub struct CommandParser {
    parts: vec::IntoIter<Frame>,
}

impl CommandParser {
    fn parse_command_name(&mut self) -> Result<String, CommandParserError> {
        let command_name = self
            .parts
            .next()
            .ok_or(CommandParserError::EmptyCommand)?;

        match command_name {
            Frame::Simple(s) => Ok(s.to_lowercase()),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_lowercase())
                .map_err(CommandParserError::InvalidUTF8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple string".to_string(),
                actual: frame,
            }),
        }
    }

    /// Number of arguments not consumed yet.
    pub(crate) fn remaining(&self) -> usize {
        self.parts.len()
    }

    pub(crate) fn next_string(&mut self) -> Result<String, CommandParserError> {
        let frame = self
            .parts
            .next()
            .ok_or(CommandParserError::EndOfStream)?;

        match frame {
            // Both `Simple` and `Bulk` representation may be strings. Strings are parsed to UTF-8.
            // While errors are stored as strings, they are considered separate types.
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_string())
                .map_err(CommandParserError::InvalidUTF8String),
            Frame::Null => Ok(String::new()),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    pub(crate) fn next_integer(&mut self) -> Result<i64, CommandParserError> {
        let frame = self
            .parts
            .next()
            .ok_or(CommandParserError::EndOfStream)?;

        match frame {
            Frame::Integer(i) => Ok(i),
            Frame::Simple(string) => string
                .parse::<i64>()
                .map_err(|_| CommandParserError::NotAnInteger),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map_err(CommandParserError::InvalidUTF8String)?
                .parse::<i64>()
                .map_err(|_| CommandParserError::NotAnInteger),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "integer".to_string(),
                actual: frame,
            }),
        }
    }

    pub(crate) fn next_count(&mut self) -> Result<usize, CommandParserError> {
        let count = self.next_integer()?;
        usize::try_from(count).map_err(|_| CommandParserError::NotPositive)
    }

    pub(crate) fn next_float(&mut self) -> Result<f64, CommandParserError> {
        let value = self
            .next_string()?
            .parse::<f64>()
            .map_err(|_| CommandParserError::NotAFloat)?;

        if value.is_nan() {
            return Err(CommandParserError::NotAFloat);
        }
        Ok(value)
    }

    pub(crate) fn next_border(&mut self) -> Result<ScoreBorder, CommandParserError> {
        Ok(self.next_string()?.parse::<ScoreBorder>()?)
    }

    pub(crate) fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        let frame = self
            .parts
            .next()
            .ok_or(CommandParserError::EndOfStream)?;

        match frame {
            // Both `Simple` and `Bulk` representation may be strings. Strings are parsed to UTF-8.
            // While errors are stored as strings, they are considered separate types.
            Frame::Simple(s) => Ok(Bytes::from(s)),
            Frame::Bulk(bytes) => Ok(bytes),
            // A null bulk inside a command stands for an empty argument.
            Frame::Null => Ok(Bytes::new()),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    /// Consumes every remaining argument as a string. Fails if there is none.
    pub(crate) fn remaining_strings(&mut self) -> Result<Vec<String>, CommandParserError> {
        let mut values = vec![self.next_string()?];
        while self.remaining() > 0 {
            values.push(self.next_string()?);
        }
        Ok(values)
    }

    /// Consumes every remaining argument as raw bytes. Fails if there is none.
    pub(crate) fn remaining_bytes(&mut self) -> Result<Vec<Bytes>, CommandParserError> {
        let mut values = vec![self.next_bytes()?];
        while self.remaining() > 0 {
            values.push(self.next_bytes()?);
        }
        Ok(values)
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub enum CommandParserError {
    #[error("invalid frame, expected {expected}, got {actual}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("empty command")]
    EmptyCommand,
    #[error("unknown command '{command}'")]
    UnknownCommand { command: String },
    #[error("syntax error, unexpected argument '{argument}' for '{command}' command")]
    InvalidCommandArgument { command: String, argument: String },
    #[error("invalid UTF-8 string")]
    InvalidUTF8String(#[from] str::Utf8Error),
    #[error("value is not an integer or out of range")]
    NotAnInteger,
    #[error("value is out of range, must be positive")]
    NotPositive,
    #[error("value is not a valid float")]
    NotAFloat,
    #[error("{0}")]
    InvalidScoreBorder(#[from] ParseScoreBorderError),
    #[error("wrong number of arguments for '{command}' command")]
    WrongNumberOfArguments { command: String },
    #[error("attempting to extract a value failed due to the frame being fully consumed")]
    EndOfStream,
}
