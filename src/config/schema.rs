//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files. Target
//! and filter properties are kept as loose string-convertible values and
//! resolved by the type's builder, so the schema does not need to know every
//! type in the catalog.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::event::SeverityLevel;
use crate::filter::FilterResult;

/// Root logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global behaviour of the reload loop and routing.
    pub settings: SettingsConfig,

    /// Further files merged into this one, relative to this file's directory.
    pub include: Vec<PathBuf>,

    /// Named output targets.
    pub targets: Vec<TargetConfig>,

    /// Rules mapping logger names and levels to targets, in evaluation order.
    pub rules: Vec<RuleConfig>,
}

impl LoggingConfig {
    /// Append the targets and rules of an included file.
    pub fn merge(&mut self, other: LoggingConfig) {
        self.targets.extend(other.targets);
        self.rules.extend(other.rules);
    }

    pub fn find_target(&self, name: &str) -> Option<&TargetConfig> {
        self.targets.iter().find(|target| target.name == name)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SettingsConfig {
    /// Watch the loaded files and reload on change.
    pub auto_reload: bool,

    /// Settle delay between the first change notification and the reload.
    pub reload_delay_ms: u64,

    /// Levels below this one get no routing entries at all.
    pub global_threshold: SeverityLevel,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            auto_reload: true,
            reload_delay_ms: 1000,
            global_threshold: SeverityLevel::Trace,
        }
    }
}

/// Scalar property value as written in TOML.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum PropertyValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Str(s) => f.write_str(s),
            PropertyValue::Int(i) => write!(f, "{i}"),
            PropertyValue::Float(v) => write!(f, "{v}"),
            PropertyValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Str(value.to_string())
    }
}

/// Target definition.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TargetConfig {
    /// Unique name referenced by `write_to`.
    pub name: String,

    /// Catalog type name (`memory`, `console`, `null`, ...).
    #[serde(rename = "type")]
    pub kind: String,

    /// Every other key, handed to the type's builder.
    #[serde(flatten)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl TargetConfig {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// Routing rule.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RuleConfig {
    /// Logger name pattern: `*`, exact name, `prefix*`, `*suffix`,
    /// `*contains*`, or a glob with `?`.
    pub logger: String,

    /// Lowest enabled level; ignored when `levels` is set.
    pub min_level: SeverityLevel,

    /// Highest enabled level; ignored when `levels` is set.
    pub max_level: SeverityLevel,

    /// Explicit level list, overriding the range.
    pub levels: Vec<SeverityLevel>,

    /// Target names, in emit order.
    pub write_to: Vec<String>,

    /// Stop evaluating later rules for loggers matching this one.
    #[serde(rename = "final")]
    pub is_final: bool,

    /// Result used when every filter of the rule abstains.
    pub filter_default_action: FilterResult,

    pub filters: Vec<FilterConfig>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            logger: "*".to_string(),
            min_level: SeverityLevel::Trace,
            max_level: SeverityLevel::Fatal,
            levels: Vec::new(),
            write_to: Vec::new(),
            is_final: false,
            filter_default_action: FilterResult::Neutral,
            filters: Vec::new(),
        }
    }
}

impl RuleConfig {
    /// Levels this rule routes, ascending and without `Off`.
    pub fn enabled_levels(&self) -> Vec<SeverityLevel> {
        let mut levels: Vec<SeverityLevel> = if self.levels.is_empty() {
            SeverityLevel::range(self.min_level, self.max_level).collect()
        } else {
            self.levels.clone()
        };
        levels.retain(|level| level.slot().is_some());
        levels.sort();
        levels.dedup();
        levels
    }
}

/// Filter definition inside a rule.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FilterConfig {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(flatten)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl FilterConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}
