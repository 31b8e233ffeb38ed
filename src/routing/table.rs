//! Immutable per-level routing table.
//!
//! # Responsibilities
//! - Hold one chain of routing entries per severity slot
//! - Walk the chain for an event: match logger, evaluate filters, render, emit
//! - Keep the targets of the configuration that produced it
//!
//! # Design Decisions
//! - Built once per configuration load and never mutated after publication
//! - Levels without entries are `None`, so dispatch there is a single branch
//! - Entries are appended in configuration order; evaluation order is
//!   deterministic
//! - Target failures are caught per entry and never reach the caller

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::event::{LogEvent, SeverityLevel};
use crate::filter::{FilterChain, FilterResult};
use crate::observability::metrics;
use crate::routing::entry::{RouteSpec, RoutingEntry};
use crate::target::Target;

#[derive(Debug)]
pub struct RoutingTable {
    generation: u64,
    slots: [Option<Box<RoutingEntry>>; SeverityLevel::SLOTS],
    targets: BTreeMap<String, Arc<dyn Target>>,
}

impl RoutingTable {
    /// Table routing nothing.
    pub fn empty(generation: u64) -> Self {
        Self {
            generation,
            slots: Default::default(),
            targets: BTreeMap::new(),
        }
    }

    /// Build a table from `(level, spec)` pairs. For each level the specs keep
    /// the order in which they are given. Specs at `Off` are dropped.
    pub fn build<I>(generation: u64, routes: I, targets: BTreeMap<String, Arc<dyn Target>>) -> Self
    where
        I: IntoIterator<Item = (SeverityLevel, RouteSpec)>,
    {
        let mut per_level: [Vec<RouteSpec>; SeverityLevel::SLOTS] = Default::default();
        for (level, spec) in routes {
            if let Some(slot) = level.slot() {
                per_level[slot].push(spec);
            }
        }

        let mut slots: [Option<Box<RoutingEntry>>; SeverityLevel::SLOTS] = Default::default();
        for (slot, specs) in per_level.into_iter().enumerate() {
            slots[slot] = specs
                .into_iter()
                .rev()
                .fold(None, |next, spec| Some(Box::new(RoutingEntry::from_spec(spec, next))));
        }

        Self {
            generation,
            slots,
            targets,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Head of the chain for `level`.
    pub fn chain(&self, level: SeverityLevel) -> Option<&RoutingEntry> {
        level.slot().and_then(|slot| self.slots[slot].as_deref())
    }

    pub fn find_target(&self, name: &str) -> Option<&Arc<dyn Target>> {
        self.targets.get(name)
    }

    pub fn targets(&self) -> impl Iterator<Item = &Arc<dyn Target>> {
        self.targets.values()
    }

    /// Whether an event at `level` from `logger` would reach any target,
    /// ignoring filters.
    pub fn is_enabled(&self, level: SeverityLevel, logger: &str) -> bool {
        let Some(head) = self.chain(level) else {
            return false;
        };

        let mut final_rule = None;
        for entry in head.iter() {
            if final_rule.is_some_and(|rule| rule != entry.rule) {
                break;
            }
            if !entry.logger.matches(logger) {
                continue;
            }
            if entry.target.is_some() {
                return true;
            }
            if entry.is_final {
                final_rule = Some(entry.rule);
            }
        }
        false
    }

    /// Route `event` through the chain for its level. Returns the number of
    /// targets invoked.
    pub fn dispatch(&self, event: &LogEvent) -> usize {
        let Some(head) = self.chain(event.level) else {
            return 0;
        };

        let mut invoked = 0;
        let mut rendered = String::new();
        let mut cached: Option<(&Arc<FilterChain>, FilterResult)> = None;
        let mut final_rule: Option<usize> = None;

        for entry in head.iter() {
            if final_rule.is_some_and(|rule| rule != entry.rule) {
                break;
            }
            if !entry.logger.matches(&event.logger_name) {
                continue;
            }
            if entry.is_final {
                final_rule = Some(entry.rule);
            }

            let result = match cached {
                Some((chain, result)) if Arc::ptr_eq(chain, &entry.filters) => result,
                _ => {
                    let result = entry.filters.evaluate(event);
                    cached = Some((&entry.filters, result));
                    result
                }
            };

            if result.suppresses() {
                tracing::trace!(
                    logger = %event.logger_name,
                    level = %event.level,
                    "Rejecting event because of a filter"
                );
                if result == FilterResult::IgnoreFinal {
                    break;
                }
                continue;
            }

            if let Some(target) = &entry.target {
                emit(target, event, &mut rendered);
                invoked += 1;
            }

            if result == FilterResult::LogFinal {
                break;
            }
        }

        metrics::record_dispatch(event.level, invoked);
        invoked
    }

    /// Flush every target, logging failures.
    pub fn flush(&self) {
        for target in self.targets.values() {
            if let Err(e) = target.flush() {
                tracing::warn!(target = %target.name(), error = %e, "Failed to flush target");
            }
        }
    }
}

fn emit(target: &Arc<dyn Target>, event: &LogEvent, buffer: &mut String) {
    buffer.clear();
    if target.wants_rendering() {
        target.layout().render_into(event, buffer);
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| target.emit(buffer)));
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(target = %target.name(), error = %e, "Target failed to write event");
            metrics::record_emit_failure(target.name());
        }
        Err(_) => {
            tracing::error!(target = %target.name(), "Target panicked while writing event");
            metrics::record_emit_failure(target.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::sync::Mutex;

    use crate::filter::tests::Fixed;
    use crate::filter::Filter;
    use crate::layout::Template;
    use crate::routing::matcher::LoggerNameMatcher;
    use crate::target::{MemoryTarget, TargetError};

    #[derive(Debug)]
    struct Failing {
        panic: bool,
        layout: Template,
    }

    impl Target for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        fn layout(&self) -> &Template {
            &self.layout
        }
        fn emit(&self, _rendered: &str) -> Result<(), TargetError> {
            if self.panic {
                panic!("target exploded");
            }
            Err(TargetError::Rejected("nope".into()))
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// Filter counting its evaluations.
    #[derive(Debug, Default)]
    struct Counting(Mutex<usize>);

    impl Filter for Counting {
        fn evaluate(&self, _event: &LogEvent) -> Result<FilterResult, crate::filter::FilterError> {
            *self.0.lock().unwrap() += 1;
            Ok(FilterResult::Neutral)
        }
    }

    fn memory(name: &str) -> Arc<MemoryTarget> {
        Arc::new(MemoryTarget::new(name, Template::compile("${message}").unwrap(), 0))
    }

    fn spec(target: Arc<dyn Target>, rule: usize) -> RouteSpec {
        RouteSpec {
            rule,
            ..RouteSpec::to_target(target)
        }
    }

    fn chain_of(filters: Vec<Arc<dyn Filter>>) -> Arc<FilterChain> {
        Arc::new(FilterChain::new(filters, FilterResult::Neutral))
    }

    fn event(level: SeverityLevel, message: &str) -> LogEvent {
        LogEvent::new(level, "app::db", message)
    }

    #[test]
    fn test_dispatch_in_order() {
        let a = memory("a");
        let b = memory("b");
        let table = RoutingTable::build(
            1,
            vec![
                (SeverityLevel::Info, spec(a.clone(), 0)),
                (SeverityLevel::Info, spec(b.clone(), 0)),
                (SeverityLevel::Error, spec(b.clone(), 0)),
            ],
            BTreeMap::new(),
        );

        assert_eq!(table.dispatch(&event(SeverityLevel::Info, "x")), 2);
        assert_eq!(table.dispatch(&event(SeverityLevel::Error, "y")), 1);
        assert_eq!(table.dispatch(&event(SeverityLevel::Debug, "z")), 0);
        assert_eq!(table.dispatch(&event(SeverityLevel::Off, "off")), 0);
        assert_eq!(a.logs(), vec!["x"]);
        assert_eq!(b.logs(), vec!["x", "y"]);
        assert!(table.chain(SeverityLevel::Debug).is_none());
    }

    #[test]
    fn test_empty_table() {
        let table = RoutingTable::empty(7);
        assert_eq!(table.generation(), 7);
        for level in SeverityLevel::ALL {
            assert!(table.chain(level).is_none());
            assert!(!table.is_enabled(level, "app"));
        }
    }

    #[test]
    fn test_failing_targets_do_not_stop_chain() {
        let after = memory("after");
        let table = RoutingTable::build(
            1,
            vec![
                (SeverityLevel::Warn, spec(Arc::new(Failing { panic: false, layout: Template::default() }), 0)),
                (SeverityLevel::Warn, spec(Arc::new(Failing { panic: true, layout: Template::default() }), 0)),
                (SeverityLevel::Warn, spec(after.clone(), 0)),
            ],
            BTreeMap::new(),
        );

        assert_eq!(table.dispatch(&event(SeverityLevel::Warn, "still here")), 3);
        assert_eq!(after.logs(), vec!["still here"]);
    }

    #[test]
    fn test_ignore_and_final_results() {
        let a = memory("a");
        let b = memory("b");
        let c = memory("c");
        let ignore = chain_of(vec![Arc::new(Fixed::Result(FilterResult::Ignore))]);
        let log_final = chain_of(vec![Arc::new(Fixed::Result(FilterResult::LogFinal))]);

        let table = RoutingTable::build(
            1,
            vec![
                (SeverityLevel::Info, RouteSpec { filters: ignore, ..spec(a.clone(), 0) }),
                (SeverityLevel::Info, RouteSpec { filters: log_final, ..spec(b.clone(), 1) }),
                (SeverityLevel::Info, spec(c.clone(), 2)),
            ],
            BTreeMap::new(),
        );

        assert_eq!(table.dispatch(&event(SeverityLevel::Info, "m")), 1);
        assert!(a.logs().is_empty());
        assert_eq!(b.logs(), vec!["m"]);
        assert!(c.logs().is_empty());
    }

    #[test]
    fn test_ignore_final_stops_walk() {
        let a = memory("a");
        let stop = chain_of(vec![Arc::new(Fixed::Result(FilterResult::IgnoreFinal))]);
        let table = RoutingTable::build(
            1,
            vec![
                (SeverityLevel::Info, RouteSpec { filters: stop, target: None, ..spec(a.clone(), 0) }),
                (SeverityLevel::Info, spec(a.clone(), 1)),
            ],
            BTreeMap::new(),
        );
        assert_eq!(table.dispatch(&event(SeverityLevel::Info, "m")), 0);
        assert!(a.logs().is_empty());
    }

    #[test]
    fn test_shared_chain_evaluated_once() {
        let counting = Arc::new(Counting::default());
        let shared = chain_of(vec![counting.clone() as Arc<dyn Filter>]);
        let table = RoutingTable::build(
            1,
            vec![
                (SeverityLevel::Info, RouteSpec { filters: shared.clone(), ..spec(memory("a"), 0) }),
                (SeverityLevel::Info, RouteSpec { filters: shared.clone(), ..spec(memory("b"), 0) }),
                (SeverityLevel::Info, RouteSpec { filters: chain_of(vec![counting.clone() as Arc<dyn Filter>]), ..spec(memory("c"), 1) }),
            ],
            BTreeMap::new(),
        );

        assert_eq!(table.dispatch(&event(SeverityLevel::Info, "m")), 3);
        assert_eq!(*counting.0.lock().unwrap(), 2);
    }

    #[test]
    fn test_logger_matching_and_final_rule() {
        let db = memory("db");
        let all = memory("all");
        let table = RoutingTable::build(
            1,
            vec![
                (
                    SeverityLevel::Info,
                    RouteSpec {
                        logger: Arc::new(LoggerNameMatcher::new("app::db*")),
                        is_final: true,
                        ..spec(db.clone(), 0)
                    },
                ),
                (SeverityLevel::Info, spec(all.clone(), 1)),
            ],
            BTreeMap::new(),
        );

        table.dispatch(&LogEvent::new(SeverityLevel::Info, "app::db", "from db"));
        table.dispatch(&LogEvent::new(SeverityLevel::Info, "app::http", "from http"));
        assert_eq!(db.logs(), vec!["from db"]);
        assert_eq!(all.logs(), vec!["from http"]);

        assert!(table.is_enabled(SeverityLevel::Info, "app::http"));
        assert!(!table.is_enabled(SeverityLevel::Warn, "app::http"));
    }

    #[test]
    fn test_blackhole_final_rule() {
        let all = memory("all");
        let table = RoutingTable::build(
            1,
            vec![
                (
                    SeverityLevel::Debug,
                    RouteSpec {
                        target: None,
                        logger: Arc::new(LoggerNameMatcher::new("noisy")),
                        is_final: true,
                        ..spec(all.clone(), 0)
                    },
                ),
                (SeverityLevel::Debug, spec(all.clone(), 1)),
            ],
            BTreeMap::new(),
        );

        assert_eq!(table.dispatch(&LogEvent::new(SeverityLevel::Debug, "noisy", "x")), 0);
        assert!(!table.is_enabled(SeverityLevel::Debug, "noisy"));
        assert_eq!(table.dispatch(&LogEvent::new(SeverityLevel::Debug, "quiet", "y")), 1);
        assert_eq!(all.logs(), vec!["y"]);
    }
}
