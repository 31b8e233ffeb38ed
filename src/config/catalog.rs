//! Registry of target and filter types.
//!
//! # Responsibilities
//! - Map configuration type names to builder factories
//! - Apply string properties through each builder's setter table
//! - Describe registered target types for diagnostics
//!
//! Type names are matched case-insensitively.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::error::ConfigError;
use crate::config::schema::{FilterConfig, TargetConfig};
use crate::filter::conditions::{MatchMode, WhenMatchBuilder};
use crate::filter::repeated::WhenRepeatedBuilder;
use crate::filter::{Filter, FilterBuilder};
use crate::target::console::ConsoleTargetBuilder;
use crate::target::memory::MemoryTargetBuilder;
use crate::target::null::NullTargetBuilder;
use crate::target::{Target, TargetBuilder, TargetCapabilities, TargetDescriptor};

pub type TargetFactory = Arc<dyn Fn() -> Box<dyn TargetBuilder> + Send + Sync>;
pub type FilterFactory = Arc<dyn Fn() -> Box<dyn FilterBuilder> + Send + Sync>;

struct TargetRegistration {
    descriptor: TargetDescriptor,
    factory: TargetFactory,
}

#[derive(Clone, Default)]
pub struct Catalog {
    targets: HashMap<String, Arc<TargetRegistration>>,
    filters: HashMap<String, FilterFactory>,
}

impl Catalog {
    /// Catalog with no registered types.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut catalog = Self::empty();

        catalog.register_target(
            TargetDescriptor::new(
                "memory",
                TargetCapabilities {
                    renders_layout: true,
                    buffered: true,
                },
            ),
            || Box::<MemoryTargetBuilder>::default(),
        );
        catalog.register_target(
            TargetDescriptor::new(
                "console",
                TargetCapabilities {
                    renders_layout: true,
                    buffered: false,
                },
            ),
            || Box::<ConsoleTargetBuilder>::default(),
        );
        catalog.register_target(
            TargetDescriptor::new("null", TargetCapabilities::default()),
            || Box::<NullTargetBuilder>::default(),
        );

        for mode in [
            MatchMode::Contains,
            MatchMode::NotContains,
            MatchMode::Equal,
            MatchMode::NotEqual,
        ] {
            catalog.register_filter(mode.type_name(), move || Box::new(WhenMatchBuilder::new(mode)));
        }
        catalog.register_filter("when-repeated", || Box::<WhenRepeatedBuilder>::default());

        catalog
    }

    /// Register a target type, replacing any previous registration of the name.
    pub fn register_target<F>(&mut self, descriptor: TargetDescriptor, factory: F)
    where
        F: Fn() -> Box<dyn TargetBuilder> + Send + Sync + 'static,
    {
        let key = descriptor.type_name.to_ascii_lowercase();
        self.targets.insert(
            key,
            Arc::new(TargetRegistration {
                descriptor,
                factory: Arc::new(factory),
            }),
        );
    }

    pub fn register_filter<F>(&mut self, type_name: &str, factory: F)
    where
        F: Fn() -> Box<dyn FilterBuilder> + Send + Sync + 'static,
    {
        self.filters
            .insert(type_name.to_ascii_lowercase(), Arc::new(factory));
    }

    pub fn target_types(&self) -> Vec<&TargetDescriptor> {
        let mut types: Vec<_> = self.targets.values().map(|r| &r.descriptor).collect();
        types.sort_by(|a, b| a.type_name.cmp(&b.type_name));
        types
    }

    pub fn filter_types(&self) -> Vec<&str> {
        let mut types: Vec<_> = self.filters.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn describe_target(&self, type_name: &str) -> Option<&TargetDescriptor> {
        self.targets
            .get(&type_name.to_ascii_lowercase())
            .map(|r| &r.descriptor)
    }

    pub fn create_target(&self, config: &TargetConfig) -> Result<Arc<dyn Target>, ConfigError> {
        let registration = self
            .targets
            .get(&config.kind.to_ascii_lowercase())
            .ok_or_else(|| ConfigError::UnknownTargetType(config.kind.clone()))?;

        let mut builder = (registration.factory)();
        for (name, value) in &config.properties {
            builder.set_property(name, &value.to_string())?;
        }
        builder.build(config.name.clone())
    }

    pub fn create_filter(&self, config: &FilterConfig) -> Result<Arc<dyn Filter>, ConfigError> {
        let factory = self
            .filters
            .get(&config.kind.to_ascii_lowercase())
            .ok_or_else(|| ConfigError::UnknownFilterType(config.kind.clone()))?;

        let mut builder = factory();
        for (name, value) in &config.properties {
            builder.set_property(name, &value.to_string())?;
        }
        builder.build()
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("targets", &self.target_types())
            .field("filters", &self.filter_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{LogEvent, SeverityLevel};
    use crate::filter::FilterResult;
    use crate::target::MemoryTarget;

    #[test]
    fn test_builtin_types() {
        let catalog = Catalog::with_builtins();
        let names: Vec<_> = catalog.target_types().iter().map(|d| d.type_name.as_str()).collect();
        assert_eq!(names, vec!["console", "memory", "null"]);
        assert_eq!(
            catalog.filter_types(),
            vec!["when-contains", "when-equal", "when-not-contains", "when-not-equal", "when-repeated"]
        );
        assert!(catalog.describe_target("MEMORY").unwrap().capabilities.buffered);
    }

    #[test]
    fn test_create_target_with_properties() {
        let catalog = Catalog::with_builtins();
        let config = TargetConfig::new("mem", "Memory")
            .with_property("layout", "${level}|${message}")
            .with_property("max-logs-count", "3");

        let target = catalog.create_target(&config).unwrap();
        assert_eq!(target.name(), "mem");
        let memory = target.as_any().downcast_ref::<MemoryTarget>().unwrap();
        assert_eq!(memory.max_logs_count(), 3);
    }

    #[test]
    fn test_unknown_types_and_properties() {
        let catalog = Catalog::with_builtins();
        assert!(matches!(
            catalog.create_target(&TargetConfig::new("x", "carrier-pigeon")),
            Err(ConfigError::UnknownTargetType(kind)) if kind == "carrier-pigeon"
        ));
        assert!(matches!(
            catalog.create_target(&TargetConfig::new("x", "null").with_property("volume", "11")),
            Err(ConfigError::UnsupportedProperty(_))
        ));
        assert!(matches!(
            catalog.create_filter(&FilterConfig::new("when-lucky")),
            Err(ConfigError::UnknownFilterType(_))
        ));
    }

    #[test]
    fn test_create_filter() {
        let catalog = Catalog::with_builtins();
        let filter = catalog
            .create_filter(
                &FilterConfig::new("when-contains")
                    .with_property("substring", "secret")
                    .with_property("action", "ignore-final"),
            )
            .unwrap();
        let event = LogEvent::new(SeverityLevel::Info, "app", "a secret");
        assert_eq!(filter.evaluate(&event).unwrap(), FilterResult::IgnoreFinal);
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::empty();
        assert!(catalog.target_types().is_empty());
        assert!(catalog.create_target(&TargetConfig::new("m", "memory")).is_err());
    }
}
