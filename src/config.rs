use clap::Parser;
use std::path::PathBuf;

pub const PORT: u16 = 6379;

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Config {
    /// The address to bind to
    #[arg(short, long, env = "BIND", default_value = "127.0.0.1")]
    pub bind: String,

    /// The port to listen on
    #[arg(short, long, env = "PORT", default_value_t = PORT)]
    pub port: u16,

    /// Path of the append-only file
    #[arg(long, env = "AOF_FILE", default_value = "appendonly.aof")]
    pub aof_file: PathBuf,

    /// Addresses of the other cluster nodes, comma separated. Leave empty to run standalone.
    #[arg(long, env = "PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,
}

impl Config {
    /// `bind:port`, which is also this node's identifier on the ring.
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn is_cluster(&self) -> bool {
        !self.peers.is_empty()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: "127.0.0.1".to_string(),
            port: PORT,
            aof_file: PathBuf::from("appendonly.aof"),
            peers: vec![],
        }
    }
}
