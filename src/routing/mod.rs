//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Table construction (per configuration load):
//!     (level, RouteSpec)[]
//!     → group by level slot, keep configuration order
//!     → link into one RoutingEntry chain per slot
//!     → freeze as immutable RoutingTable
//!
//! Dispatch (per log call):
//!     LogEvent
//!     → slot for event.level (absent: return)
//!     → matcher.rs (logger name) → FilterChain → render → Target::emit
//! ```
//!
//! # Design Decisions
//! - Tables are immutable at runtime; reconfiguration builds a new one
//! - No regex in hot path
//! - Deterministic: same input always reaches the same targets in the same order

pub mod entry;
pub mod matcher;
pub mod table;

pub use entry::{RouteSpec, RoutingEntry};
pub use matcher::LoggerNameMatcher;
pub use table::RoutingTable;
