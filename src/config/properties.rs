//! Named property setters for targets and filters.
//!
//! Every buildable type declares a static table mapping property names to
//! setter functions. Lookups ignore ASCII case, `_` and `-`, so
//! `max_logs_count`, `maxLogsCount` and `max-logs-count` name the same setter.

use std::fmt;
use std::str::FromStr;

use crate::config::error::{ConfigError, UnsupportedPropertyError};
use crate::layout::TemplateSyntaxError;

/// Failure of a single setter, turned into a `ConfigError` by `PropertySetters::apply`.
#[derive(Debug)]
pub enum PropertyError {
    Invalid(String),
    Template(TemplateSyntaxError),
}

impl From<TemplateSyntaxError> for PropertyError {
    fn from(err: TemplateSyntaxError) -> Self {
        PropertyError::Template(err)
    }
}

pub type Setter<B> = fn(&mut B, &str) -> Result<(), PropertyError>;

/// Static table of setters for builder type `B`.
pub struct PropertySetters<B: 'static> {
    owner: &'static str,
    setters: &'static [(&'static str, Setter<B>)],
}

impl<B: 'static> PropertySetters<B> {
    pub const fn new(owner: &'static str, setters: &'static [(&'static str, Setter<B>)]) -> Self {
        Self { owner, setters }
    }

    /// Resolve `name` and run its setter against `builder`.
    pub fn apply(&self, builder: &mut B, name: &str, value: &str) -> Result<(), ConfigError> {
        let wanted = normalize(name);
        let setter = self
            .setters
            .iter()
            .find(|(candidate, _)| normalize(candidate) == wanted)
            .map(|(_, setter)| *setter)
            .ok_or_else(|| UnsupportedPropertyError {
                owner: self.owner.to_string(),
                property: name.to_string(),
            })?;

        setter(builder, value).map_err(|err| match err {
            PropertyError::Template(err) => ConfigError::Template(err),
            PropertyError::Invalid(reason) => ConfigError::InvalidProperty {
                owner: self.owner.to_string(),
                property: name.to_string(),
                value: value.to_string(),
                reason,
            },
        })
    }

    pub fn owner(&self) -> &'static str {
        self.owner
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.setters.iter().map(|(name, _)| *name)
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

pub fn parse_bool(value: &str) -> Result<bool, PropertyError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(PropertyError::Invalid("expected a boolean".to_string())),
    }
}

pub fn parse_value<T>(value: &str) -> Result<T, PropertyError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err: T::Err| PropertyError::Invalid(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Probe {
        count: usize,
        enabled: bool,
    }

    fn set_count(probe: &mut Probe, value: &str) -> Result<(), PropertyError> {
        probe.count = parse_value(value)?;
        Ok(())
    }

    fn set_enabled(probe: &mut Probe, value: &str) -> Result<(), PropertyError> {
        probe.enabled = parse_bool(value)?;
        Ok(())
    }

    const SETTERS: PropertySetters<Probe> =
        PropertySetters::new("probe", &[("max_count", set_count), ("enabled", set_enabled)]);

    #[test]
    fn test_name_normalization() {
        let mut probe = Probe::default();
        SETTERS.apply(&mut probe, "maxCount", "3").unwrap();
        assert_eq!(probe.count, 3);
        SETTERS.apply(&mut probe, "MAX-COUNT", "4").unwrap();
        assert_eq!(probe.count, 4);
        SETTERS.apply(&mut probe, "enabled", "yes").unwrap();
        assert!(probe.enabled);
    }

    #[test]
    fn test_unknown_property() {
        let mut probe = Probe::default();
        let err = SETTERS.apply(&mut probe, "colour", "red").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnsupportedProperty(UnsupportedPropertyError { ref property, .. }) if property == "colour"
        ));
    }

    #[test]
    fn test_invalid_value() {
        let mut probe = Probe::default();
        let err = SETTERS.apply(&mut probe, "max_count", "lots").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProperty { .. }));
        assert_eq!(SETTERS.names().collect::<Vec<_>>(), vec!["max_count", "enabled"]);
    }
}
