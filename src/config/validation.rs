//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (rules reference existing targets)
//! - Validate level ranges and logger patterns
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: LoggingConfig → Result<(), Vec<ValidationError>>
//! - Runs before any target is constructed, so a bad reload has no side effects

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::LoggingConfig;

/// A single semantic problem. Rules are identified by their zero-based index.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("target #{0} has an empty name")]
    EmptyTargetName(usize),

    #[error("duplicate target name '{0}'")]
    DuplicateTarget(String),

    #[error("rule #{rule} writes to unknown target '{target}'")]
    UnknownTarget { rule: usize, target: String },

    #[error("rule #{rule} has min_level above max_level")]
    InvertedLevels { rule: usize },

    #[error("rule #{rule} writes to no targets")]
    NoTargets { rule: usize },

    #[error("rule #{rule} has an empty logger pattern")]
    EmptyLoggerPattern { rule: usize },
}

pub fn validate_config(config: &LoggingConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut names = HashSet::new();

    for (index, target) in config.targets.iter().enumerate() {
        if target.name.trim().is_empty() {
            errors.push(ValidationError::EmptyTargetName(index));
        } else if !names.insert(target.name.as_str()) {
            errors.push(ValidationError::DuplicateTarget(target.name.clone()));
        }
    }

    for (rule_index, rule) in config.rules.iter().enumerate() {
        if rule.logger.is_empty() {
            errors.push(ValidationError::EmptyLoggerPattern { rule: rule_index });
        }
        if rule.levels.is_empty() && rule.min_level > rule.max_level {
            errors.push(ValidationError::InvertedLevels { rule: rule_index });
        }
        // A final rule without targets is a blackhole for its loggers.
        if rule.write_to.is_empty() && !rule.is_final {
            errors.push(ValidationError::NoTargets { rule: rule_index });
        }
        for target in &rule.write_to {
            if !names.contains(target.as_str()) {
                errors.push(ValidationError::UnknownTarget {
                    rule: rule_index,
                    target: target.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RuleConfig, TargetConfig};
    use crate::event::SeverityLevel;

    fn rule(write_to: &[&str]) -> RuleConfig {
        RuleConfig {
            write_to: write_to.iter().map(|s| s.to_string()).collect(),
            ..RuleConfig::default()
        }
    }

    #[test]
    fn test_valid_config() {
        let config = LoggingConfig {
            targets: vec![TargetConfig::new("mem", "memory")],
            rules: vec![rule(&["mem"])],
            ..LoggingConfig::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let config = LoggingConfig {
            targets: vec![
                TargetConfig::new("mem", "memory"),
                TargetConfig::new("mem", "null"),
                TargetConfig::new(" ", "null"),
            ],
            rules: vec![
                rule(&["missing"]),
                RuleConfig {
                    min_level: SeverityLevel::Error,
                    max_level: SeverityLevel::Info,
                    ..rule(&["mem"])
                },
                rule(&[]),
                RuleConfig {
                    logger: String::new(),
                    ..rule(&["mem"])
                },
            ],
            ..LoggingConfig::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateTarget("mem".into()),
                ValidationError::EmptyTargetName(2),
                ValidationError::UnknownTarget { rule: 0, target: "missing".into() },
                ValidationError::InvertedLevels { rule: 1 },
                ValidationError::NoTargets { rule: 2 },
                ValidationError::EmptyLoggerPattern { rule: 3 },
            ]
        );
    }

    #[test]
    fn test_final_rule_may_be_empty() {
        let config = LoggingConfig {
            rules: vec![RuleConfig {
                logger: "noisy::*".into(),
                is_final: true,
                ..RuleConfig::default()
            }],
            ..LoggingConfig::default()
        };
        assert!(validate_config(&config).is_ok());
    }
}
