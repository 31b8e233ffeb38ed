//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::validation::ValidationError;
use crate::layout::TemplateSyntaxError;

/// A property name that the target or filter type does not define.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{owner} has no property named '{property}'")]
pub struct UnsupportedPropertyError {
    pub owner: String,
    pub property: String,
}

/// Errors that abort a configuration load or reload.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("template error: {0}")]
    Template(#[from] TemplateSyntaxError),

    #[error(transparent)]
    UnsupportedProperty(#[from] UnsupportedPropertyError),

    #[error("invalid value '{value}' for property '{property}' of {owner}: {reason}")]
    InvalidProperty {
        owner: String,
        property: String,
        value: String,
        reason: String,
    },

    #[error("{owner} requires property '{property}'")]
    MissingProperty { owner: String, property: &'static str },

    #[error("unknown target type '{0}'")]
    UnknownTargetType(String),

    #[error("unknown filter type '{0}'")]
    UnknownFilterType(String),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
