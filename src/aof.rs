//! Append-only file.
//!
//! Every write command that executes successfully is encoded back into RESP and appended to a
//! file. Connections never touch the file themselves: they hand frames to a bounded queue drained
//! by a single writer task, so records from concurrent connections never interleave. A write is
//! queued in the same critical section that executes it, so the log holds writes in the order
//! they changed the keyspace. On startup the file is decoded with the same codec used for the
//! network and replayed against the store.

use bytes::Bytes;
use futures::StreamExt;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::codec::FramedRead;
use tracing::{debug, error, info, warn};

use crate::codec::FrameCodec;
use crate::commands;
use crate::frame::Frame;
use crate::store::Store;
use crate::ttl::unix_now;
use crate::Error;

const QUEUE_DEPTH: usize = 16;

/// Replay gives up once the file produces nothing for this long.
const REPLAY_QUIET_PERIOD: Duration = Duration::from_secs(1);

/// Producer side of the log. Cheap to clone; the writer task stops once every clone is dropped
/// and the queue is drained.
#[derive(Clone)]
pub struct Aof {
    sender: mpsc::Sender<Frame>,
    /// Held while a write executes and is queued.
    order: Arc<Mutex<()>>,
}

impl Aof {
    /// Opens `path` for appending, creating it if needed, and spawns the writer task.
    pub async fn open(path: &Path) -> Result<(Aof, JoinHandle<()>), Error> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        let (sender, receiver) = mpsc::channel(QUEUE_DEPTH);
        let writer = tokio::spawn(write_loop(file, receiver));

        let aof = Aof {
            sender,
            order: Arc::new(Mutex::new(())),
        };
        Ok((aof, writer))
    }

    /// Runs the write command `frame` through `execute` and queues `frame` unless the reply is an
    /// error.
    ///
    /// A queue slot is reserved first, waiting only while the queue is full. Execution and the
    /// hand-off to the queue then happen under one lock shared by every writer, so no other write
    /// can run, and be logged, in between.
    pub async fn record<F>(&self, frame: Frame, execute: F) -> Frame
    where
        F: FnOnce() -> Frame,
    {
        let permit = match self.sender.reserve().await {
            Ok(permit) => Some(permit),
            Err(_) => {
                error!("append-only file writer is gone, dropping record");
                None
            }
        };

        let _turn = self.order.lock().unwrap_or_else(PoisonError::into_inner);
        let reply = execute();
        if let Some(permit) = permit {
            if !reply.is_error() {
                permit.send(frame);
            }
        }

        reply
    }
}

async fn write_loop(mut file: File, mut receiver: mpsc::Receiver<Frame>) {
    while let Some(frame) = receiver.recv().await {
        debug!(%frame, "appending");
        if let Err(e) = write_record(&mut file, &frame).await {
            error!("failed to append to the append-only file: {}", e);
        }
    }

    debug!("append-only file writer stopped");
}

async fn write_record(file: &mut File, frame: &Frame) -> std::io::Result<()> {
    file.write_all(&frame.serialize()).await?;
    file.flush().await
}

/// Replays the log at `path` into `store`. A missing file is an empty log. Returns the number of
/// commands replayed.
pub async fn load(path: &Path, store: &Store) -> Result<usize, Error> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("no append-only file at {}, starting empty", path.display());
            return Ok(0);
        }
        Err(e) => return Err(e.into()),
    };

    let replayed = replay(file, store).await;
    info!("replayed {} commands from {}", replayed, path.display());
    Ok(replayed)
}

/// Decodes commands from `reader` and executes them against `store` until the input ends or stays
/// quiet for [`REPLAY_QUIET_PERIOD`]. Malformed records are skipped. Returns the number of
/// commands that executed without an error reply.
pub async fn replay<R>(reader: R, store: &Store) -> usize
where
    R: AsyncRead + Unpin,
{
    let mut frames = FramedRead::new(reader, FrameCodec::new());
    let mut replayed = 0;
    let mut failed = 0;

    loop {
        let frame = match time::timeout(REPLAY_QUIET_PERIOD, frames.next()).await {
            Err(_) => {
                warn!("append-only file went quiet, stopping replay");
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                error!("failed to read the append-only file: {}", e);
                break;
            }
            Ok(Some(Ok(Err(e)))) => {
                warn!("skipping malformed record: {}", e);
                continue;
            }
            Ok(Some(Ok(Ok(frame)))) => frame,
        };

        if !matches!(frame, Frame::Array(_)) {
            warn!(%frame, "skipping record that is not a command");
            continue;
        }

        match commands::execute(frame, store) {
            Frame::Error(e) => {
                warn!("replayed command failed: {}", e);
                failed += 1;
            }
            _ => replayed += 1,
        }
    }

    if failed > 0 {
        warn!("{} replayed commands failed", failed);
    }
    replayed
}

/// Rewrites `EXPIRE key seconds` into `EXPIREAT key deadline`, so that the logged command means
/// the same thing no matter when it is replayed. Any other frame is returned untouched.
pub fn expire_to_expireat(frame: Frame) -> Frame {
    match frame {
        Frame::Array(parts) if is_expire(&parts) => {
            let seconds = argument(&parts[2])
                .and_then(|seconds| std::str::from_utf8(seconds).ok())
                .and_then(|seconds| seconds.parse::<i64>().ok())
                .unwrap_or_default();
            let deadline = unix_now().saturating_add(seconds);

            Frame::Array(vec![
                Frame::Bulk(Bytes::from_static(b"expireat")),
                parts[1].clone(),
                Frame::Bulk(Bytes::from(deadline.to_string())),
            ])
        }
        frame => frame,
    }
}

fn is_expire(parts: &[Frame]) -> bool {
    parts.len() == 3
        && argument(&parts[0]).is_some_and(|name| name.eq_ignore_ascii_case(b"expire"))
        && argument(&parts[2])
            .and_then(|seconds| std::str::from_utf8(seconds).ok())
            .is_some_and(|seconds| seconds.parse::<i64>().is_ok())
}

fn argument(frame: &Frame) -> Option<&[u8]> {
    match frame {
        Frame::Bulk(bytes) => Some(&bytes[..]),
        Frame::Simple(s) => Some(s.as_bytes()),
        _ => None,
    }
}
