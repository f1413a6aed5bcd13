//! HTTP API request handlers.

mod analyze;
mod copy;
mod export;
mod probe;
mod screenshot;
mod stream;
mod system;

pub use analyze::analyze;
pub use copy::augment_copy;
pub use export::export_pdf;
pub use probe::probe_models;
pub use screenshot::screenshot;
pub use stream::{analyze_stream_get, analyze_stream_post};
pub use system::health;
