#![allow(dead_code)]

use redis::aio::MultiplexedConnection;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use ringdis::config::Config;
use ringdis::server::Backend;

pub struct TestServer {
    pub address: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<ringdis::Result<()>>,
}

impl TestServer {
    /// Starts a standalone node on an ephemeral port, logging to `aof_file`.
    pub async fn start(aof_file: PathBuf) -> TestServer {
        let config = Config {
            aof_file,
            ..Config::default()
        };
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        TestServer::serve(config, listener).await
    }

    /// Starts a node listening on exactly `config.address()`.
    pub async fn start_with(config: Config) -> TestServer {
        let listener = TcpListener::bind(config.address()).await.unwrap();
        TestServer::serve(config, listener).await
    }

    async fn serve(config: Config, listener: TcpListener) -> TestServer {
        let address = listener.local_addr().unwrap();
        let backend = Backend::new(config).await.unwrap();
        let (shutdown, rx) = oneshot::channel();
        let handle = tokio::spawn(backend.serve(listener, rx));

        TestServer {
            address,
            shutdown,
            handle,
        }
    }

    pub async fn connect(&self) -> MultiplexedConnection {
        let client = redis::Client::open(format!("redis://{}/", self.address)).unwrap();
        client.get_multiplexed_async_connection().await.unwrap()
    }

    /// Stops accepting, waits for open connections and flushes the append-only file.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        self.handle.await.unwrap().unwrap();
    }
}
