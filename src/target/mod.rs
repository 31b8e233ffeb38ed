//! Output targets.
//!
//! A target receives the text its bound layout rendered for an event and
//! delivers it somewhere. Targets are created through the catalog from string
//! properties and shared by every routing entry that writes to them.

pub mod console;
pub mod memory;
pub mod null;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::config::ConfigError;
use crate::layout::Template;

pub use console::ConsoleTarget;
pub use memory::MemoryTarget;
pub use null::NullTarget;

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("target rejected the message: {0}")]
    Rejected(String),
}

pub trait Target: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Template rendered for every event this target accepts.
    fn layout(&self) -> &Template;

    fn emit(&self, rendered: &str) -> Result<(), TargetError>;

    fn flush(&self) -> Result<(), TargetError> {
        Ok(())
    }

    /// Whether dispatch needs to render the layout before calling `emit`.
    fn wants_rendering(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any;
}

/// Builder for a target type, populated from string properties.
pub trait TargetBuilder: Send {
    fn set_property(&mut self, name: &str, value: &str) -> Result<(), ConfigError>;
    fn build(self: Box<Self>, name: String) -> Result<Arc<dyn Target>, ConfigError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetCapabilities {
    pub renders_layout: bool,
    pub buffered: bool,
}

/// Static description of a registered target type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    pub type_name: String,
    pub capabilities: TargetCapabilities,
}

impl TargetDescriptor {
    pub fn new(type_name: impl Into<String>, capabilities: TargetCapabilities) -> Self {
        Self {
            type_name: type_name.into(),
            capabilities,
        }
    }
}
