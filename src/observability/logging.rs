//! Structured logging for the crate's own diagnostics.
//!
//! # Design Decisions
//! - Uses the tracing crate; the filter comes from `RUST_LOG` when set
//! - Falls back to `hotlog=info`, or the caller's default

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str = "hotlog=info";

/// Install the global subscriber writing to stderr. Safe to call more than
/// once; later calls are ignored.
pub fn init_logging(default_filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.unwrap_or(DEFAULT_FILTER).into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
