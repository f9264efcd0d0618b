use bytes::{Bytes, BytesMut};
use std::io;
use thiserror::Error as ThisError;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::frame::{DataType, Frame};

/// Longest line accepted before a newline shows up. Guards against clients streaming garbage
/// without ever terminating a line.
const MAX_INLINE_LENGTH: usize = 64 * 1024;

/// Largest bulk string accepted.
const MAX_BULK_LENGTH: i64 = 512 * 1024 * 1024;

/// Largest number of elements a multi-bulk header may announce.
const MAX_MULTI_BULK_LENGTH: i64 = 1024 * 1024;

static CRLF: &[u8; 2] = b"\r\n";

#[derive(Debug, Clone, ThisError, PartialEq)]
pub enum ProtocolError {
    #[error("invalid multibulk length")]
    InvalidMultiBulkLength,
    #[error("invalid bulk length")]
    InvalidBulkLength,
    #[error("invalid integer reply")]
    InvalidInteger,
    #[error("invalid line terminator")]
    InvalidTerminator,
    #[error("too big inline request")]
    LineTooLong,
}

/// Everything the decoder hands out: a frame, or the reason a frame could not be decoded.
///
/// Decode errors travel inside the item rather than as the decoder's error so that a `Framed`
/// stream keeps going after a malformed frame. Only I/O failures end the stream.
pub type Payload = Result<Frame, ProtocolError>;

#[derive(Debug, Default)]
enum ReadState {
    /// Waiting for the first line of a frame.
    #[default]
    Header,
    /// Inside a multi-bulk, waiting for the `$<len>` line of the next argument.
    MultiBulkArgs { expected: usize, args: Vec<Frame> },
    /// Waiting for `len` raw bytes plus CRLF. `expected` is set when the body belongs to a
    /// multi-bulk.
    BulkBody {
        len: usize,
        expected: Option<usize>,
        args: Vec<Frame>,
    },
}

/// Incremental RESP codec.
///
/// The decoder keeps its position between calls, so it can be fed a stream one byte at a time
/// and still produce the same frames as when fed in one go. Besides regular RESP it accepts inline
/// commands: a plain line such as `PING` or `SET key value` decodes to an array of bulk strings.
#[derive(Debug, Default)]
pub struct FrameCodec {
    state: ReadState,
}

impl FrameCodec {
    pub fn new() -> FrameCodec {
        FrameCodec::default()
    }

    fn header(&mut self, line: &[u8]) -> Option<Payload> {
        let (first, rest) = line.split_first()?;

        match DataType::try_from(*first) {
            Ok(DataType::Array) => {
                let expected = match parse_integer(rest) {
                    Some(n) if (0..=MAX_MULTI_BULK_LENGTH).contains(&n) => n as usize,
                    _ => return Some(Err(ProtocolError::InvalidMultiBulkLength)),
                };
                if expected == 0 {
                    return Some(Ok(Frame::Array(vec![])));
                }
                self.state = ReadState::MultiBulkArgs {
                    expected,
                    args: Vec::with_capacity(expected),
                };
                None
            }
            Ok(DataType::BulkString) => match parse_integer(rest) {
                Some(-1) => Some(Ok(Frame::Null)),
                Some(len) if (0..=MAX_BULK_LENGTH).contains(&len) => {
                    self.state = ReadState::BulkBody {
                        len: len as usize,
                        expected: None,
                        args: vec![],
                    };
                    None
                }
                _ => Some(Err(ProtocolError::InvalidBulkLength)),
            },
            Ok(DataType::SimpleString) => Some(Ok(Frame::Simple(
                String::from_utf8_lossy(rest).into_owned(),
            ))),
            Ok(DataType::SimpleError) => Some(Ok(Frame::Error(
                String::from_utf8_lossy(rest).into_owned(),
            ))),
            Ok(DataType::Integer) => Some(
                parse_integer(rest)
                    .map(Frame::Integer)
                    .ok_or(ProtocolError::InvalidInteger),
            ),
            Err(_) => {
                let parts: Vec<Frame> = line
                    .split(|b| *b == b' ')
                    .filter(|part| !part.is_empty())
                    .map(|part| Frame::Bulk(Bytes::copy_from_slice(part)))
                    .collect();
                if parts.is_empty() {
                    return None;
                }
                Some(Ok(Frame::Array(parts)))
            }
        }
    }

    /// Handles one line read while collecting the arguments of a multi-bulk.
    fn multi_bulk_arg(
        &mut self,
        line: &[u8],
        expected: usize,
        mut args: Vec<Frame>,
    ) -> Option<Payload> {
        match line.split_first() {
            Some((b'$', rest)) => match parse_integer(rest) {
                Some(len) if len < 0 => args.push(Frame::Null),
                Some(len) if len <= MAX_BULK_LENGTH => {
                    self.state = ReadState::BulkBody {
                        len: len as usize,
                        expected: Some(expected),
                        args,
                    };
                    return None;
                }
                _ => return Some(Err(ProtocolError::InvalidBulkLength)),
            },
            // Lenient: anything else counts as an argument on its own.
            _ => args.push(Frame::Bulk(Bytes::copy_from_slice(line))),
        }

        self.finish_arg(expected, args)
    }

    fn finish_arg(&mut self, expected: usize, args: Vec<Frame>) -> Option<Payload> {
        if args.len() == expected {
            return Some(Ok(Frame::Array(args)));
        }
        self.state = ReadState::MultiBulkArgs { expected, args };
        None
    }
}

impl Decoder for FrameCodec {
    type Item = Payload;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match std::mem::take(&mut self.state) {
                ReadState::BulkBody {
                    len,
                    expected,
                    mut args,
                } => {
                    if src.len() < len + CRLF.len() {
                        src.reserve(len + CRLF.len() - src.len());
                        self.state = ReadState::BulkBody {
                            len,
                            expected,
                            args,
                        };
                        return Ok(None);
                    }

                    let data = src.split_to(len).freeze();
                    let terminator = src.split_to(CRLF.len());
                    if &terminator[..] != CRLF {
                        return Ok(Some(Err(ProtocolError::InvalidTerminator)));
                    }

                    match expected {
                        None => return Ok(Some(Ok(Frame::Bulk(data)))),
                        Some(expected) => {
                            args.push(Frame::Bulk(data));
                            if let Some(payload) = self.finish_arg(expected, args) {
                                return Ok(Some(payload));
                            }
                        }
                    }
                }
                state => {
                    let line = match read_line(src) {
                        Some(Ok(line)) => line,
                        Some(Err(err)) => return Ok(Some(Err(err))),
                        None => {
                            self.state = state;
                            return Ok(None);
                        }
                    };

                    let payload = match state {
                        ReadState::MultiBulkArgs { expected, args } => {
                            self.multi_bulk_arg(&line, expected, args)
                        }
                        _ => self.header(&line),
                    };
                    if let Some(payload) = payload {
                        return Ok(Some(payload));
                    }
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(payload) => Ok(Some(payload)),
            None => {
                if !src.is_empty() {
                    warn!("discarding {} bytes of an incomplete frame", src.len());
                    src.clear();
                }
                Ok(None)
            }
        }
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = io::Error;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&frame.serialize());
        Ok(())
    }
}

/// Splits one CRLF terminated line off `src`, without the terminator.
fn read_line(src: &mut BytesMut) -> Option<Result<BytesMut, ProtocolError>> {
    let Some(end) = src.iter().position(|b| *b == b'\n') else {
        if src.len() > MAX_INLINE_LENGTH {
            src.clear();
            return Some(Err(ProtocolError::LineTooLong));
        }
        return None;
    };

    let mut line = src.split_to(end + 1);
    if line.len() < CRLF.len() || line[line.len() - CRLF.len()] != b'\r' {
        return Some(Err(ProtocolError::InvalidTerminator));
    }
    line.truncate(line.len() - CRLF.len());
    Some(Ok(line))
}

fn parse_integer(digits: &[u8]) -> Option<i64> {
    std::str::from_utf8(digits).ok()?.parse().ok()
}
