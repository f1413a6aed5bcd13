pub mod config;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;
pub mod types;

pub use config::{DEFAULT_LOG_FILTER, ServerArgs};
pub use routes::create_router;
pub use server::HttpServer;
pub use state::AppState;

/// Builds the full application from parsed arguments.
pub fn app(args: &ServerArgs) -> pagelift_core::Result<axum::Router> {
    let state = AppState::from_args(args)?;
    Ok(create_router(state, args.request_timeout()))
}
