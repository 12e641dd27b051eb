//! Console logging plus an in-memory buffer of recent entries.

pub mod buffer;
pub mod layer;
pub mod types;

pub use buffer::LogBuffer;
pub use layer::BufferLayer;
pub use types::{LogEntry, LogLevel};

use tracing::Level;
use tracing_subscriber::{
    filter::Targets, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

const DEFAULT_FILTER: &str = "leadsite=debug,tower_http=debug,axum::rejection=trace";

/// Installs the global subscriber: `RUST_LOG`-filtered console output, and
/// the crate's own INFO+ events mirrored into `buffer`.
pub fn init_tracing(buffer: LogBuffer) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .with(
            BufferLayer::new(buffer)
                .with_filter(Targets::new().with_target(env!("CARGO_CRATE_NAME"), Level::INFO)),
        )
        .init();
}
