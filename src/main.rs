use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vesper_uci::UciEngine;

fn main() -> Result<()> {
    // stdout belongs to the protocol.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "vesper starting");
    UciEngine::new().run().context("UCI loop failed")
}
