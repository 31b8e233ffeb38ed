//! Log event model.
//!
//! # Responsibilities
//! - Define the ordered severity levels used to index routing slots
//! - Carry everything a template or filter may look at (logger, message,
//!   timestamp, properties, exception text)
//!
//! # Design Decisions
//! - Events are plain owned data; dispatch only ever borrows them
//! - `Off` is a level with no routing slot so "disabled" needs no Option

pub mod level;
pub mod log_event;

pub use level::SeverityLevel;
pub use log_event::LogEvent;
