//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Trigger config reload
//!
//! Shutdown (shutdown.rs):
//!     trigger → reload loop exits, watches dropped → targets flushed → exit
//! ```
//!
//! # Design Decisions
//! - One broadcast channel reaches every long-running task
//! - Targets are flushed after the reload loop has stopped

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::{wait_for_signal, Signal};
