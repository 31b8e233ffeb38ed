//! Log event dispatch with hot configuration reload.

pub mod config;
pub mod event;
pub mod filter;
pub mod layout;
pub mod lifecycle;
pub mod logger;
pub mod observability;
pub mod routing;
pub mod target;

pub use config::{Catalog, ConfigError, ConfigurationManager, LoggingConfig, ReloadOutcome};
pub use event::{LogEvent, SeverityLevel};
pub use layout::Template;
pub use lifecycle::Shutdown;
pub use logger::{LogFactory, Logger};
pub use routing::RoutingTable;
