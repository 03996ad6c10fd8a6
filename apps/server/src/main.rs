use anyhow::Context;
use polar_kernel::config::load_config;
use polar_kernel::domain::config::ApiConfig;
use polar_logger::Logger;
use polar_server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // An explicit path must exist; without one `server.*` is optional.
    let path = std::env::args().nth(1);
    let cfg: ApiConfig = load_config(path).context("Critical: Configuration is malformed")?;

    let _log = Logger::from_config(env!("CARGO_PKG_NAME"), &cfg.logging)?;

    Server::builder().config(cfg).build().await?.run().await
}
