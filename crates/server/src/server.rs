//! HTTP API server

use std::future::Future;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerArgs;
use crate::routes::create_router;
use crate::state::AppState;

pub struct HttpServer {
    args: ServerArgs,
    state: AppState,
}

impl HttpServer {
    pub fn new(args: ServerArgs) -> Result<Self> {
        let state = AppState::from_args(&args).context("Failed to initialize application state")?;
        Ok(Self { args, state })
    }

    /// Serves until `shutdown` resolves, then drains open connections.
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let app = create_router(self.state, self.args.request_timeout());

        let listener = TcpListener::bind(self.args.listen).await.context("Failed to bind HTTP server")?;
        info!("HTTP API server listening on http://{}", self.args.listen);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("HTTP server shutting down");
            })
            .await
            .context("HTTP server error")?;

        Ok(())
    }
}
