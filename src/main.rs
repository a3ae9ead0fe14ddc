//! The artifact-fetcher server binary.

use artifact_fetcher::{ArtifactFetcher, Config, run_server};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON configuration file. Every setting has a default, so this is optional.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Override `server.api.bind_address` (default 127.0.0.1:9090).
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Override `fetch.storage_dir` (default `file`).
    #[arg(long)]
    storage_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = <Args as clap::Parser>::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(bind) = args.bind {
        config.server.api.bind_address = bind;
    }
    if let Some(storage_dir) = args.storage_dir {
        config.fetch.storage_dir = storage_dir;
    }

    let fetcher = ArtifactFetcher::new(config).await?;
    run_server(fetcher).await?;

    Ok(())
}
