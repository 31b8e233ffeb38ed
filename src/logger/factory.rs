//! Cache of named loggers.

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::ConfigurationManager;
use crate::logger::{Logger, Sink};

/// Hands out one `Logger` per name, all sharing the factory's sink.
#[derive(Debug)]
pub struct LogFactory {
    sink: Sink,
    loggers: DashMap<String, Logger>,
}

impl LogFactory {
    pub fn new(manager: Arc<ConfigurationManager>) -> Self {
        Self {
            sink: Sink::Live(manager),
            loggers: DashMap::new(),
        }
    }

    /// Factory whose loggers drop everything.
    pub fn disabled() -> Self {
        Self {
            sink: Sink::Null,
            loggers: DashMap::new(),
        }
    }

    pub fn get_logger(&self, name: &str) -> Logger {
        if let Some(logger) = self.loggers.get(name) {
            return logger.clone();
        }
        self.loggers
            .entry(name.to_string())
            .or_insert_with(|| Logger::new(name, self.sink.clone()))
            .clone()
    }

    pub fn manager(&self) -> Option<&Arc<ConfigurationManager>> {
        match &self.sink {
            Sink::Live(manager) => Some(manager),
            Sink::Null => None,
        }
    }

    pub fn logger_count(&self) -> usize {
        self.loggers.len()
    }

    pub fn flush(&self) {
        if let Some(manager) = self.manager() {
            manager.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingConfig;

    #[test]
    fn test_loggers_are_cached() {
        let manager = Arc::new(ConfigurationManager::from_config(LoggingConfig::default()).unwrap());
        let factory = LogFactory::new(manager);

        let a = factory.get_logger("app::db");
        let b = factory.get_logger("app::db");
        factory.get_logger("app::http");

        assert_eq!(a.name(), b.name());
        assert_eq!(factory.logger_count(), 2);
        assert!(factory.manager().is_some());
        factory.flush();
    }

    #[test]
    fn test_disabled_factory() {
        let factory = LogFactory::disabled();
        let logger = factory.get_logger("app");
        assert_eq!(logger.error("nothing"), 0);
        assert!(factory.manager().is_none());
    }
}
