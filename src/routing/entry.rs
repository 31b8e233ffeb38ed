//! Routing entries: one (target, filter chain) pair per rule, level and target.

use std::fmt;
use std::sync::Arc;

use crate::filter::FilterChain;
use crate::routing::matcher::LoggerNameMatcher;
use crate::target::Target;

/// Input to `RoutingTable::build`, one per entry to append.
#[derive(Clone)]
pub struct RouteSpec {
    /// `None` for a final rule without targets: it only stops later rules.
    pub target: Option<Arc<dyn Target>>,
    pub filters: Arc<FilterChain>,
    pub logger: Arc<LoggerNameMatcher>,
    /// Index of the rule that produced this spec.
    pub rule: usize,
    pub is_final: bool,
}

impl RouteSpec {
    /// Spec for a target with no filters, matching every logger.
    pub fn to_target(target: Arc<dyn Target>) -> Self {
        Self {
            target: Some(target),
            filters: Arc::new(FilterChain::default()),
            logger: Arc::new(LoggerNameMatcher::Any),
            rule: 0,
            is_final: false,
        }
    }
}

impl fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSpec")
            .field("target", &self.target.as_ref().map(|t| t.name().to_string()))
            .field("logger", &self.logger.to_string())
            .field("rule", &self.rule)
            .field("is_final", &self.is_final)
            .finish()
    }
}

/// Node of a per-level chain. Never mutated once the table is published.
pub struct RoutingEntry {
    pub(crate) target: Option<Arc<dyn Target>>,
    pub(crate) filters: Arc<FilterChain>,
    pub(crate) logger: Arc<LoggerNameMatcher>,
    pub(crate) rule: usize,
    pub(crate) is_final: bool,
    pub(crate) next: Option<Box<RoutingEntry>>,
}

impl RoutingEntry {
    pub(crate) fn from_spec(spec: RouteSpec, next: Option<Box<RoutingEntry>>) -> Self {
        Self {
            target: spec.target,
            filters: spec.filters,
            logger: spec.logger,
            rule: spec.rule,
            is_final: spec.is_final,
            next,
        }
    }

    pub fn target(&self) -> Option<&Arc<dyn Target>> {
        self.target.as_ref()
    }

    pub fn filters(&self) -> &Arc<FilterChain> {
        &self.filters
    }

    pub fn logger(&self) -> &LoggerNameMatcher {
        &self.logger
    }

    pub fn rule(&self) -> usize {
        self.rule
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn next(&self) -> Option<&RoutingEntry> {
        self.next.as_deref()
    }

    /// This entry followed by the rest of the chain.
    pub fn iter(&self) -> Iter<'_> {
        Iter { next: Some(self) }
    }
}

impl Drop for RoutingEntry {
    // Unlink iteratively so a long chain does not recurse on drop.
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(mut entry) = next {
            next = entry.next.take();
        }
    }
}

impl fmt::Debug for RoutingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|entry| {
                (
                    entry.target.as_ref().map(|t| t.name().to_string()),
                    entry.logger.to_string(),
                    entry.rule,
                )
            }))
            .finish()
    }
}

pub struct Iter<'a> {
    next: Option<&'a RoutingEntry>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a RoutingEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.next.as_deref();
        Some(current)
    }
}
