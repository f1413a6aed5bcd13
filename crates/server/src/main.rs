use anyhow::Result;
use clap::Parser;
use pagelift_server::{DEFAULT_LOG_FILTER, HttpServer, ServerArgs};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .init();

    let args = ServerArgs::parse();
    let server = HttpServer::new(args)?;

    server
        .run(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "failed to listen for shutdown signal");
            }
        })
        .await
}
