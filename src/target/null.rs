//! Target that discards everything.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::properties::{parse_bool, PropertyError, PropertySetters};
use crate::config::ConfigError;
use crate::layout::Template;
use crate::target::{Target, TargetBuilder, TargetError};

/// Discards events. With `format_message` the layout is still rendered, which
/// is useful for measuring render cost.
#[derive(Debug)]
pub struct NullTarget {
    name: String,
    layout: Template,
    format_message: bool,
    discarded: AtomicU64,
}

impl NullTarget {
    pub fn new(name: impl Into<String>, layout: Template, format_message: bool) -> Self {
        Self {
            name: name.into(),
            layout,
            format_message,
            discarded: AtomicU64::new(0),
        }
    }

    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}

impl Target for NullTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn layout(&self) -> &Template {
        &self.layout
    }

    fn emit(&self, _rendered: &str) -> Result<(), TargetError> {
        self.discarded.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn wants_rendering(&self) -> bool {
        self.format_message
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Default)]
pub struct NullTargetBuilder {
    layout: Template,
    format_message: bool,
}

impl NullTargetBuilder {
    const SETTERS: PropertySetters<Self> = PropertySetters::new(
        "target type 'null'",
        &[
            ("layout", Self::set_layout),
            ("format_message", Self::set_format_message),
        ],
    );

    fn set_layout(&mut self, value: &str) -> Result<(), PropertyError> {
        self.layout = Template::compile(value)?;
        Ok(())
    }

    fn set_format_message(&mut self, value: &str) -> Result<(), PropertyError> {
        self.format_message = parse_bool(value)?;
        Ok(())
    }
}

impl TargetBuilder for NullTargetBuilder {
    fn set_property(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        Self::SETTERS.apply(self, name, value)
    }

    fn build(self: Box<Self>, name: String) -> Result<Arc<dyn Target>, ConfigError> {
        Ok(Arc::new(NullTarget::new(name, self.layout, self.format_message)))
    }
}
