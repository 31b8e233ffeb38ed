//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + includes
//!     → loader.rs (parse & merge)
//!     → validation.rs (semantic checks)
//!     → builder.rs (catalog → targets, filters → RoutingTable)
//!     → manager.rs (atomic publish)
//!
//! On change:
//!     watcher.rs coalesces file events into one trigger
//!     → manager.rs waits the settle delay, re-arms the watcher
//!     → reload through the same path
//!     → failure keeps the published table
//! ```
//!
//! # Design Decisions
//! - Tables are immutable once built; changes require a full rebuild
//! - All schema fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Target and filter properties are strings resolved by each type's setter table

pub mod builder;
pub mod catalog;
pub mod error;
pub mod loader;
pub mod manager;
pub mod properties;
pub mod schema;
pub mod source;
pub mod validation;
pub mod watcher;

pub use builder::build_routing_table;
pub use catalog::Catalog;
pub use error::{ConfigError, UnsupportedPropertyError};
pub use loader::{load_config, parse_config, LoadedConfig};
pub use manager::{ConfigurationManager, ReloadOutcome};
pub use schema::{FilterConfig, LoggingConfig, PropertyValue, RuleConfig, SettingsConfig, TargetConfig};
pub use source::{ConfigSource, FileConfigSource, StaticConfigSource};
pub use validation::{validate_config, ValidationError};
pub use watcher::{ChangeDebouncer, DebounceState};
