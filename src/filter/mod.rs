//! Filters and filter chains.
//!
//! # Responsibilities
//! - Define the five-valued filter outcome
//! - Evaluate an ordered chain of filters against an event
//! - Provide the built-in filter types registered in the catalog
//!
//! # Design Decisions
//! - First non-`Neutral` result wins; when every filter abstains the chain's
//!   default action applies
//! - A failing or panicking filter counts as `Neutral` so events are not
//!   silently lost

pub mod conditions;
pub mod repeated;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::event::LogEvent;
use crate::observability::metrics;

pub use conditions::{MatchMode, WhenMatchFilter};
pub use repeated::WhenRepeatedFilter;

/// Outcome of evaluating a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum FilterResult {
    /// Abstain and defer to the next filter.
    #[default]
    Neutral,
    /// Write to the target.
    Log,
    /// Do not write to this target.
    Ignore,
    /// Write to the target, then stop walking the chain.
    LogFinal,
    /// Do not write, and stop walking the chain.
    IgnoreFinal,
}

impl FilterResult {
    pub fn suppresses(self) -> bool {
        matches!(self, FilterResult::Ignore | FilterResult::IgnoreFinal)
    }

    pub fn is_final(self) -> bool {
        matches!(self, FilterResult::LogFinal | FilterResult::IgnoreFinal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterResult::Neutral => "neutral",
            FilterResult::Log => "log",
            FilterResult::Ignore => "ignore",
            FilterResult::LogFinal => "log-final",
            FilterResult::IgnoreFinal => "ignore-final",
        }
    }
}

impl fmt::Display for FilterResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown filter result '{0}'")]
pub struct ParseFilterResultError(pub String);

impl FromStr for FilterResult {
    type Err = ParseFilterResultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "neutral" => Ok(FilterResult::Neutral),
            "log" => Ok(FilterResult::Log),
            "ignore" => Ok(FilterResult::Ignore),
            "logfinal" => Ok(FilterResult::LogFinal),
            "ignorefinal" => Ok(FilterResult::IgnoreFinal),
            _ => Err(ParseFilterResultError(s.to_string())),
        }
    }
}

impl TryFrom<String> for FilterResult {
    type Error = ParseFilterResultError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FilterResult> for String {
    fn from(result: FilterResult) -> Self {
        result.as_str().to_string()
    }
}

/// Error raised by a filter while evaluating an event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("filter evaluation failed: {0}")]
pub struct FilterError(pub String);

/// A predicate deciding whether a target receives an event.
pub trait Filter: Send + Sync + fmt::Debug {
    fn evaluate(&self, event: &LogEvent) -> Result<FilterResult, FilterError>;
}

/// Builder for a filter type, populated from string properties.
pub trait FilterBuilder: Send {
    fn set_property(&mut self, name: &str, value: &str) -> Result<(), ConfigError>;
    fn build(self: Box<Self>) -> Result<Arc<dyn Filter>, ConfigError>;
}

/// Ordered filters of one rule, shared by every entry that rule produces.
#[derive(Debug, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn Filter>>,
    default_action: FilterResult,
}

impl FilterChain {
    pub fn new(filters: Vec<Arc<dyn Filter>>, default_action: FilterResult) -> Self {
        Self {
            filters,
            default_action,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn default_action(&self) -> FilterResult {
        self.default_action
    }

    /// Evaluate filters in registration order.
    pub fn evaluate(&self, event: &LogEvent) -> FilterResult {
        if self.filters.is_empty() {
            return FilterResult::Neutral;
        }

        for filter in &self.filters {
            match panic::catch_unwind(AssertUnwindSafe(|| filter.evaluate(event))) {
                Ok(Ok(FilterResult::Neutral)) => {}
                Ok(Ok(result)) => return result,
                Ok(Err(err)) => {
                    tracing::warn!(
                        filter = ?filter,
                        logger = %event.logger_name,
                        error = %err,
                        "Filter evaluation failed, treating as neutral"
                    );
                    metrics::record_filter_error();
                }
                Err(_) => {
                    tracing::error!(
                        filter = ?filter,
                        logger = %event.logger_name,
                        "Filter panicked, treating as neutral"
                    );
                    metrics::record_filter_error();
                }
            }
        }

        self.default_action
    }
}
