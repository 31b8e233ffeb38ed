//! In-memory target keeping rendered lines for inspection.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::properties::{parse_value, PropertyError, PropertySetters};
use crate::config::ConfigError;
use crate::layout::Template;
use crate::target::{Target, TargetBuilder, TargetError};

/// Stores rendered lines. `max_logs_count == 0` means unbounded; otherwise the
/// oldest line is evicted once the limit is reached.
#[derive(Debug)]
pub struct MemoryTarget {
    name: String,
    layout: Template,
    max_logs_count: usize,
    logs: Mutex<VecDeque<String>>,
}

impl MemoryTarget {
    pub fn new(name: impl Into<String>, layout: Template, max_logs_count: usize) -> Self {
        Self {
            name: name.into(),
            layout,
            max_logs_count,
            logs: Mutex::new(VecDeque::new()),
        }
    }

    pub fn logs(&self) -> Vec<String> {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.logs.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn max_logs_count(&self) -> usize {
        self.max_logs_count
    }
}

impl Target for MemoryTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn layout(&self) -> &Template {
        &self.layout
    }

    fn emit(&self, rendered: &str) -> Result<(), TargetError> {
        let mut logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
        if self.max_logs_count > 0 && logs.len() >= self.max_logs_count {
            logs.pop_front();
        }
        logs.push_back(rendered.to_string());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Default)]
pub struct MemoryTargetBuilder {
    layout: Template,
    max_logs_count: usize,
}

impl MemoryTargetBuilder {
    const SETTERS: PropertySetters<Self> = PropertySetters::new(
        "target type 'memory'",
        &[
            ("layout", Self::set_layout),
            ("max_logs_count", Self::set_max_logs_count),
        ],
    );

    fn set_layout(&mut self, value: &str) -> Result<(), PropertyError> {
        self.layout = Template::compile(value)?;
        Ok(())
    }

    fn set_max_logs_count(&mut self, value: &str) -> Result<(), PropertyError> {
        self.max_logs_count = parse_value(value)?;
        Ok(())
    }
}

impl TargetBuilder for MemoryTargetBuilder {
    fn set_property(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        Self::SETTERS.apply(self, name, value)
    }

    fn build(self: Box<Self>, name: String) -> Result<Arc<dyn Target>, ConfigError> {
        Ok(Arc::new(MemoryTarget::new(name, self.layout, self.max_logs_count)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_eviction() {
        let target = MemoryTarget::new("mem", Template::default(), 2);
        for line in ["one", "two", "three"] {
            target.emit(line).unwrap();
        }
        assert_eq!(target.logs(), vec!["two", "three"]);

        target.clear();
        assert!(target.logs().is_empty());
    }

    #[test]
    fn test_builder_properties() {
        let mut builder = Box::<MemoryTargetBuilder>::default();
        builder.set_property("maxLogsCount", "5").unwrap();
        builder.set_property("layout", "${message}").unwrap();
        assert!(matches!(
            builder.set_property("colour", "red"),
            Err(ConfigError::UnsupportedProperty(_))
        ));
        assert!(matches!(
            builder.set_property("max_logs_count", "lots"),
            Err(ConfigError::InvalidProperty { .. })
        ));

        let target = builder.build("mem".into()).unwrap();
        let memory = target.as_any().downcast_ref::<MemoryTarget>().unwrap();
        assert_eq!(memory.max_logs_count(), 5);
        assert_eq!(target.layout().source(), "${message}");
        assert_eq!(target.name(), "mem");
    }
}
