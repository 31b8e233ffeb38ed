//! Text comparison filters: `when-contains`, `when-not-contains`,
//! `when-equal` and `when-not-equal`.

use std::sync::Arc;

use crate::config::properties::{parse_bool, parse_value, PropertyError, PropertySetters};
use crate::config::ConfigError;
use crate::event::LogEvent;
use crate::filter::{Filter, FilterBuilder, FilterError, FilterResult};
use crate::layout::Template;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Contains,
    NotContains,
    Equal,
    NotEqual,
}

impl MatchMode {
    pub fn type_name(self) -> &'static str {
        match self {
            MatchMode::Contains => "when-contains",
            MatchMode::NotContains => "when-not-contains",
            MatchMode::Equal => "when-equal",
            MatchMode::NotEqual => "when-not-equal",
        }
    }

    fn operand_property(self) -> &'static str {
        match self {
            MatchMode::Contains | MatchMode::NotContains => "substring",
            MatchMode::Equal | MatchMode::NotEqual => "compare_to",
        }
    }
}

/// Returns `action` when the rendered layout satisfies the comparison,
/// `Neutral` otherwise.
#[derive(Debug)]
pub struct WhenMatchFilter {
    mode: MatchMode,
    layout: Template,
    operand: String,
    ignore_case: bool,
    action: FilterResult,
}

impl Filter for WhenMatchFilter {
    fn evaluate(&self, event: &LogEvent) -> Result<FilterResult, FilterError> {
        let mut rendered = self.layout.render(event);
        if self.ignore_case {
            rendered = rendered.to_lowercase();
        }

        let matched = match self.mode {
            MatchMode::Contains => rendered.contains(&self.operand),
            MatchMode::NotContains => !rendered.contains(&self.operand),
            MatchMode::Equal => rendered == self.operand,
            MatchMode::NotEqual => rendered != self.operand,
        };

        Ok(if matched { self.action } else { FilterResult::Neutral })
    }
}

pub struct WhenMatchBuilder {
    mode: MatchMode,
    layout: Template,
    operand: Option<String>,
    ignore_case: bool,
    action: FilterResult,
}

impl WhenMatchBuilder {
    const CONTAINS: PropertySetters<Self> = PropertySetters::new(
        "filter type 'when-contains'",
        &[
            ("layout", Self::set_layout),
            ("substring", Self::set_operand),
            ("ignore_case", Self::set_ignore_case),
            ("action", Self::set_action),
        ],
    );

    const NOT_CONTAINS: PropertySetters<Self> = PropertySetters::new(
        "filter type 'when-not-contains'",
        &[
            ("layout", Self::set_layout),
            ("substring", Self::set_operand),
            ("ignore_case", Self::set_ignore_case),
            ("action", Self::set_action),
        ],
    );

    const EQUAL: PropertySetters<Self> = PropertySetters::new(
        "filter type 'when-equal'",
        &[
            ("layout", Self::set_layout),
            ("compare_to", Self::set_operand),
            ("ignore_case", Self::set_ignore_case),
            ("action", Self::set_action),
        ],
    );

    const NOT_EQUAL: PropertySetters<Self> = PropertySetters::new(
        "filter type 'when-not-equal'",
        &[
            ("layout", Self::set_layout),
            ("compare_to", Self::set_operand),
            ("ignore_case", Self::set_ignore_case),
            ("action", Self::set_action),
        ],
    );

    pub fn new(mode: MatchMode) -> Self {
        Self {
            mode,
            layout: Template::compile("${message}").unwrap_or_default(),
            operand: None,
            ignore_case: false,
            action: FilterResult::Ignore,
        }
    }

    fn setters(&self) -> &'static PropertySetters<Self> {
        match self.mode {
            MatchMode::Contains => &Self::CONTAINS,
            MatchMode::NotContains => &Self::NOT_CONTAINS,
            MatchMode::Equal => &Self::EQUAL,
            MatchMode::NotEqual => &Self::NOT_EQUAL,
        }
    }

    fn set_layout(&mut self, value: &str) -> Result<(), PropertyError> {
        self.layout = Template::compile(value)?;
        Ok(())
    }

    fn set_operand(&mut self, value: &str) -> Result<(), PropertyError> {
        self.operand = Some(value.to_string());
        Ok(())
    }

    fn set_ignore_case(&mut self, value: &str) -> Result<(), PropertyError> {
        self.ignore_case = parse_bool(value)?;
        Ok(())
    }

    fn set_action(&mut self, value: &str) -> Result<(), PropertyError> {
        self.action = parse_value(value)?;
        Ok(())
    }
}

impl FilterBuilder for WhenMatchBuilder {
    fn set_property(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        let setters = self.setters();
        setters.apply(self, name, value)
    }

    fn build(self: Box<Self>) -> Result<Arc<dyn Filter>, ConfigError> {
        let Some(operand) = self.operand else {
            return Err(ConfigError::MissingProperty {
                owner: format!("filter type '{}'", self.mode.type_name()),
                property: self.mode.operand_property(),
            });
        };
        let operand = if self.ignore_case { operand.to_lowercase() } else { operand };

        Ok(Arc::new(WhenMatchFilter {
            mode: self.mode,
            layout: self.layout,
            operand,
            ignore_case: self.ignore_case,
            action: self.action,
        }))
    }
}
