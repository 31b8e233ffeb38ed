//! Severity levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordered severity of a log event.
///
/// `Off` sorts above every real level and owns no routing slot.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum SeverityLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
    Off = 6,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown severity level '{0}'")]
pub struct ParseLevelError(pub String);

impl SeverityLevel {
    /// Number of levels that own a routing slot (`Trace..=Fatal`).
    pub const SLOTS: usize = 6;

    /// Every level that owns a routing slot, lowest first.
    pub const ALL: [SeverityLevel; Self::SLOTS] = [
        SeverityLevel::Trace,
        SeverityLevel::Debug,
        SeverityLevel::Info,
        SeverityLevel::Warn,
        SeverityLevel::Error,
        SeverityLevel::Fatal,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Routing slot index, `None` for `Off`.
    pub fn slot(self) -> Option<usize> {
        match self {
            SeverityLevel::Off => None,
            level => Some(level.ordinal()),
        }
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        match ordinal {
            0 => Some(SeverityLevel::Trace),
            1 => Some(SeverityLevel::Debug),
            2 => Some(SeverityLevel::Info),
            3 => Some(SeverityLevel::Warn),
            4 => Some(SeverityLevel::Error),
            5 => Some(SeverityLevel::Fatal),
            6 => Some(SeverityLevel::Off),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeverityLevel::Trace => "Trace",
            SeverityLevel::Debug => "Debug",
            SeverityLevel::Info => "Info",
            SeverityLevel::Warn => "Warn",
            SeverityLevel::Error => "Error",
            SeverityLevel::Fatal => "Fatal",
            SeverityLevel::Off => "Off",
        }
    }

    /// Levels in `min..=max` that own a routing slot.
    pub fn range(min: SeverityLevel, max: SeverityLevel) -> impl Iterator<Item = SeverityLevel> {
        Self::ALL
            .into_iter()
            .filter(move |level| *level >= min && *level <= max)
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeverityLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(ordinal) = trimmed.parse::<usize>() {
            return Self::from_ordinal(ordinal).ok_or_else(|| ParseLevelError(s.to_string()));
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => Ok(SeverityLevel::Trace),
            "debug" => Ok(SeverityLevel::Debug),
            "info" | "information" => Ok(SeverityLevel::Info),
            "warn" | "warning" => Ok(SeverityLevel::Warn),
            "error" => Ok(SeverityLevel::Error),
            "fatal" | "critical" => Ok(SeverityLevel::Fatal),
            "off" | "none" => Ok(SeverityLevel::Off),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

impl TryFrom<String> for SeverityLevel {
    type Error = ParseLevelError;

    fn try_from(value: String) -> Result<Self, ParseLevelError> {
        value.parse()
    }
}

impl From<SeverityLevel> for String {
    fn from(level: SeverityLevel) -> Self {
        level.as_str().to_ascii_lowercase()
    }
}
