use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, instrument, warn};

use crate::aof::{self, Aof};
use crate::cluster::Cluster;
use crate::commands::executable::Executable;
use crate::commands::Command;
use crate::config::Config;
use crate::connection::Connection;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// A node: the keyspace, its append-only file and, with peers configured, its cluster view.
pub struct Backend {
    config: Config,
    store: Store,
    aof: Aof,
    aof_writer: JoinHandle<()>,
    cluster: Option<Arc<Cluster>>,
}

/// What every connection handler shares.
#[derive(Clone)]
struct Context {
    store: Store,
    aof: Aof,
    cluster: Option<Arc<Cluster>>,
}

impl Backend {
    /// Replays the append-only file into a fresh keyspace, then opens it for appending. Failing
    /// to open the file is fatal.
    pub async fn new(config: Config) -> Result<Backend, Error> {
        let _ = tracing_subscriber::fmt()
            .try_init()
            .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

        let store = Store::new();
        aof::load(&config.aof_file, &store).await?;
        let (aof, aof_writer) = Aof::open(&config.aof_file).await?;

        let cluster = config.is_cluster().then(|| {
            info!("cluster mode with peers {:?}", config.peers);
            Arc::new(Cluster::new(config.address(), config.peers.clone()))
        });

        Ok(Backend {
            config,
            store,
            aof,
            aof_writer,
            cluster,
        })
    }

    pub fn store(&self) -> Store {
        self.store.clone()
    }

    /// Serves on the configured address until the process receives ctrl-c.
    pub async fn start(self) -> Result<(), Error> {
        self.run_until(async {
            if let Err(e) = signal::ctrl_c().await {
                error!("failed to listen for ctrl-c: {}", e);
            }
        })
        .await
    }

    /// Serves on the configured address until `shutdown` resolves.
    pub async fn run_until(self, shutdown: impl Future) -> Result<(), Error> {
        let listener = TcpListener::bind(self.config.address()).await?;
        self.serve(listener, shutdown).await
    }

    /// Accepts connections on `listener` until `shutdown` resolves, then lets open connections
    /// finish the command they are running, closes peer connections and flushes the
    /// append-only file.
    pub async fn serve(self, listener: TcpListener, shutdown: impl Future) -> Result<(), Error> {
        let Backend {
            store,
            aof,
            aof_writer,
            cluster,
            ..
        } = self;

        info!("ringdis listening on {}", listener.local_addr()?);

        let token = CancellationToken::new();
        let tracker = TaskTracker::new();

        if let Some(cluster) = cluster.clone() {
            let token = token.clone();
            tracker.spawn(async move { cluster.heartbeat(token).await });
        }

        let context = Context {
            store,
            aof,
            cluster,
        };

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => {
                    let (socket, client_address) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                            continue;
                        }
                    };
                    info!("Accepted connection from {:?}", client_address);

                    let context = context.clone();
                    let token = token.clone();
                    tracker.spawn(async move {
                        if let Err(e) = handle_connection(socket, client_address, context, token).await {
                            error!("Connection error: {}", e);
                        }
                    });
                }
            }
        }

        info!("Shutting down");
        drop(listener);
        token.cancel();
        tracker.close();
        tracker.wait().await;

        if let Some(cluster) = &context.cluster {
            cluster.close().await;
        }

        // The writer drains its queue once the last producer is gone.
        drop(context);
        aof_writer.await?;

        info!("Shutdown complete");
        Ok(())
    }
}

#[instrument(
    name = "connection",
    skip(stream, context, shutdown),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    context: Context,
    shutdown: CancellationToken,
) -> Result<(), Error> {
    let mut conn = Connection::new(stream, client_address);

    tracing::Span::current()
        .record("connection_id", conn.id.to_string())
        .record("client_address", client_address.to_string());

    loop {
        let payload = tokio::select! {
            _ = shutdown.cancelled() => break,
            payload = conn.read_payload() => payload?,
        };

        let frame = match payload {
            None => break,
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                warn!("Protocol error: {}", e);
                conn.write_frame(Frame::Error(format!("ERR Protocol error: {}", e)))
                    .await?;
                continue;
            }
        };

        debug!(%frame, "Received frame from client");
        context.handle(&mut conn, frame).await?;
    }

    info!("Connection closed");
    Ok(())
}

impl Context {
    /// Runs one command, locally or on the node owning its key, and writes the reply.
    async fn handle(&self, conn: &mut Connection, frame: Frame) -> Result<(), Error> {
        if !matches!(frame, Frame::Array(_)) {
            let reply = Frame::Error("ERR Protocol error: expected a command array".to_string());
            return conn.write_frame(reply).await;
        }

        let frame = aof::expire_to_expireat(frame);
        let command = match Command::try_from(frame.clone()) {
            Ok(command) => command,
            Err(e) => return conn.write_frame(Frame::Error(format!("ERR {}", e))).await,
        };

        if let Some(cluster) = &self.cluster {
            if let Some(node) = command.key().and_then(|key| cluster.owner(key)) {
                let reply = cluster.forward(node, frame).await;
                debug!(%reply, node, "Relaying reply");
                return conn.write_frame(reply).await;
            }
        }

        let is_write = command.is_write();
        let store = self.store.clone();
        let run = move || {
            command
                .exec(store)
                .unwrap_or_else(|e| Frame::Error(e.to_string()))
        };

        // Writes are logged before the reply goes out.
        let reply = if is_write {
            self.aof.record(frame, run).await
        } else {
            run()
        };

        debug!(%reply, "Sending response to client");
        conn.write_frame(reply).await
    }
}
