//! The event handed to filters, templates and targets.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};

use crate::event::SeverityLevel;

/// A single log event.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub level: SeverityLevel,
    pub logger_name: String,
    pub message: String,
    pub timestamp: DateTime<Local>,
    /// Structured properties, ordered by key so renderers are deterministic.
    pub properties: BTreeMap<String, String>,
    pub exception: Option<String>,
}

impl LogEvent {
    /// Create an event stamped with the current local time.
    pub fn new(level: SeverityLevel, logger_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            logger_name: logger_name.into(),
            message: message.into(),
            timestamp: Local::now(),
            properties: BTreeMap::new(),
            exception: None,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let event = LogEvent::new(SeverityLevel::Info, "app", "hello")
            .with_property("user", "alice")
            .with_exception("boom");

        assert_eq!(event.level, SeverityLevel::Info);
        assert_eq!(event.logger_name, "app");
        assert_eq!(event.property("user"), Some("alice"));
        assert_eq!(event.property("missing"), None);
        assert_eq!(event.exception.as_deref(), Some("boom"));
    }
}
