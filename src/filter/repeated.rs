//! `when-repeated` filter: suppresses events whose rendered layout was seen
//! within the timeout window.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::properties::{parse_value, PropertyError, PropertySetters};
use crate::config::ConfigError;
use crate::event::LogEvent;
use crate::filter::{Filter, FilterBuilder, FilterError, FilterResult};
use crate::layout::Template;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_CACHE_SIZE: usize = 50_000;

#[derive(Debug)]
pub struct WhenRepeatedFilter {
    layout: Template,
    timeout: Duration,
    max_cache_size: usize,
    action: FilterResult,
    seen: DashMap<String, Instant>,
}

impl WhenRepeatedFilter {
    pub fn cached_entries(&self) -> usize {
        self.seen.len()
    }

    fn prune(&self, now: Instant) {
        self.seen
            .retain(|_, last| now.saturating_duration_since(*last) < self.timeout);
        if self.seen.len() >= self.max_cache_size {
            // Still full of live entries: start over rather than grow unbounded.
            self.seen.clear();
        }
    }
}

impl Filter for WhenRepeatedFilter {
    fn evaluate(&self, event: &LogEvent) -> Result<FilterResult, FilterError> {
        let key = self.layout.render(event);
        let now = Instant::now();

        let last = self.seen.get(&key).map(|entry| *entry);
        if let Some(last) = last {
            if now.saturating_duration_since(last) < self.timeout {
                return Ok(self.action);
            }
        }

        if last.is_none() && self.seen.len() >= self.max_cache_size {
            self.prune(now);
        }
        self.seen.insert(key, now);
        Ok(FilterResult::Neutral)
    }
}

pub struct WhenRepeatedBuilder {
    layout: Template,
    timeout: Duration,
    max_cache_size: usize,
    action: FilterResult,
}

impl WhenRepeatedBuilder {
    const SETTERS: PropertySetters<Self> = PropertySetters::new(
        "filter type 'when-repeated'",
        &[
            ("layout", Self::set_layout),
            ("timeout_seconds", Self::set_timeout_seconds),
            ("max_cache_size", Self::set_max_cache_size),
            ("action", Self::set_action),
        ],
    );

    fn set_layout(&mut self, value: &str) -> Result<(), PropertyError> {
        self.layout = Template::compile(value)?;
        Ok(())
    }

    fn set_timeout_seconds(&mut self, value: &str) -> Result<(), PropertyError> {
        let seconds: f64 = parse_value(value)?;
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(PropertyError::Invalid("expected a non-negative number of seconds".into()));
        }
        self.timeout =
            Duration::try_from_secs_f64(seconds).map_err(|e| PropertyError::Invalid(e.to_string()))?;
        Ok(())
    }

    fn set_max_cache_size(&mut self, value: &str) -> Result<(), PropertyError> {
        let size: usize = parse_value(value)?;
        if size == 0 {
            return Err(PropertyError::Invalid("must be at least 1".into()));
        }
        self.max_cache_size = size;
        Ok(())
    }

    fn set_action(&mut self, value: &str) -> Result<(), PropertyError> {
        self.action = parse_value(value)?;
        Ok(())
    }
}

impl Default for WhenRepeatedBuilder {
    fn default() -> Self {
        Self {
            layout: Template::compile("${message}").unwrap_or_default(),
            timeout: DEFAULT_TIMEOUT,
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            action: FilterResult::Ignore,
        }
    }
}

impl FilterBuilder for WhenRepeatedBuilder {
    fn set_property(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        Self::SETTERS.apply(self, name, value)
    }

    fn build(self: Box<Self>) -> Result<Arc<dyn Filter>, ConfigError> {
        Ok(Arc::new(WhenRepeatedFilter {
            layout: self.layout,
            timeout: self.timeout,
            max_cache_size: self.max_cache_size,
            action: self.action,
            seen: DashMap::new(),
        }))
    }
}
