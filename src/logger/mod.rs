//! User-facing logging facade.
//!
//! A `Logger` is a named handle bound to a `Sink`. The live sink forwards to
//! the configuration manager's current routing table; the null sink turns
//! every call into a no-op, for libraries that log before (or without) any
//! configuration.

pub mod factory;

use std::sync::Arc;

use crate::config::ConfigurationManager;
use crate::event::{LogEvent, SeverityLevel};

pub use factory::LogFactory;

/// Where a logger's events go.
#[derive(Debug, Clone)]
pub enum Sink {
    Null,
    Live(Arc<ConfigurationManager>),
}

#[derive(Debug, Clone)]
pub struct Logger {
    name: Arc<str>,
    sink: Sink,
}

impl Logger {
    pub fn new(name: impl Into<Arc<str>>, sink: Sink) -> Self {
        Self {
            name: name.into(),
            sink,
        }
    }

    /// Logger that drops everything.
    pub fn null(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, Sink::Null)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self, level: SeverityLevel) -> bool {
        match &self.sink {
            Sink::Null => false,
            Sink::Live(manager) => manager.is_enabled(level, &self.name),
        }
    }

    /// Dispatch a prepared event under this logger's name. Returns the number
    /// of targets invoked.
    pub fn log_event(&self, mut event: LogEvent) -> usize {
        match &self.sink {
            Sink::Null => 0,
            Sink::Live(manager) => {
                if event.logger_name != *self.name {
                    event.logger_name = self.name.to_string();
                }
                manager.dispatch(&event)
            }
        }
    }

    pub fn log(&self, level: SeverityLevel, message: impl Into<String>) -> usize {
        match &self.sink {
            Sink::Null => 0,
            Sink::Live(manager) => manager.dispatch(&LogEvent::new(level, &*self.name, message)),
        }
    }

    pub fn trace(&self, message: impl Into<String>) -> usize {
        self.log(SeverityLevel::Trace, message)
    }

    pub fn debug(&self, message: impl Into<String>) -> usize {
        self.log(SeverityLevel::Debug, message)
    }

    pub fn info(&self, message: impl Into<String>) -> usize {
        self.log(SeverityLevel::Info, message)
    }

    pub fn warn(&self, message: impl Into<String>) -> usize {
        self.log(SeverityLevel::Warn, message)
    }

    pub fn error(&self, message: impl Into<String>) -> usize {
        self.log(SeverityLevel::Error, message)
    }

    pub fn fatal(&self, message: impl Into<String>) -> usize {
        self.log(SeverityLevel::Fatal, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoggingConfig, RuleConfig, TargetConfig};
    use crate::target::MemoryTarget;

    fn manager() -> Arc<ConfigurationManager> {
        let config = LoggingConfig {
            targets: vec![TargetConfig::new("mem", "memory").with_property("layout", "${logger}:${message}")],
            rules: vec![RuleConfig {
                min_level: SeverityLevel::Info,
                write_to: vec!["mem".into()],
                ..RuleConfig::default()
            }],
            ..LoggingConfig::default()
        };
        Arc::new(ConfigurationManager::from_config(config).unwrap())
    }

    #[test]
    fn test_null_sink_never_dispatches() {
        let logger = Logger::null("app");
        assert_eq!(logger.fatal("ignored"), 0);
        assert!(!logger.is_enabled(SeverityLevel::Fatal));
    }

    #[test]
    fn test_live_sink() {
        let manager = manager();
        let logger = Logger::new("app", Sink::Live(manager.clone()));

        assert_eq!(logger.debug("too low"), 0);
        assert_eq!(logger.info("hello"), 1);
        assert_eq!(logger.log_event(LogEvent::new(SeverityLevel::Error, "other", "renamed")), 1);
        assert!(logger.is_enabled(SeverityLevel::Warn));
        assert!(!logger.is_enabled(SeverityLevel::Trace));

        let target = manager.find_target("mem").unwrap();
        let memory = target.as_any().downcast_ref::<MemoryTarget>().unwrap();
        assert_eq!(memory.logs(), vec!["app:hello", "app:renamed"]);
    }
}
