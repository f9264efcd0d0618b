use clap::Parser;
use ringdis::config::Config;
use ringdis::server::Backend;
use ringdis::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::parse();

    Backend::new(config).await?.start().await
}
