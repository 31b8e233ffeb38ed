//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured diagnostics through tracing)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stderr via the tracing fmt layer
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Diagnostics about the logging pipeline never go through the pipeline
//!   itself, so a broken configuration cannot hide its own errors
//! - Metrics are cheap (atomic increments) and no-ops until a recorder is
//!   installed

pub mod logging;
pub mod metrics;
