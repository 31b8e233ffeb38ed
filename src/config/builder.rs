//! Turns a validated `LoggingConfig` into a `RoutingTable`.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::catalog::Catalog;
use crate::config::error::ConfigError;
use crate::config::schema::LoggingConfig;
use crate::config::validation::validate_config;
use crate::filter::FilterChain;
use crate::routing::{LoggerNameMatcher, RouteSpec, RoutingTable};
use crate::target::Target;

/// Validate `config`, materialize its targets and filters through `catalog`,
/// and link the routing chains. Nothing is published here; any error leaves
/// the caller's current table untouched.
pub fn build_routing_table(
    config: &LoggingConfig,
    catalog: &Catalog,
    generation: u64,
) -> Result<RoutingTable, ConfigError> {
    validate_config(config).map_err(ConfigError::Validation)?;

    let mut targets: BTreeMap<String, Arc<dyn Target>> = BTreeMap::new();
    for target_config in &config.targets {
        let target = catalog.create_target(target_config)?;
        targets.insert(target_config.name.clone(), target);
    }

    let threshold = config.settings.global_threshold;
    let mut routes = Vec::new();

    for (index, rule) in config.rules.iter().enumerate() {
        let filters = rule
            .filters
            .iter()
            .map(|filter| catalog.create_filter(filter))
            .collect::<Result<Vec<_>, _>>()?;
        let chain = Arc::new(FilterChain::new(filters, rule.filter_default_action));
        let logger = Arc::new(LoggerNameMatcher::new(&rule.logger));

        // Validation guarantees every name resolves.
        let rule_targets: Vec<Option<Arc<dyn Target>>> = if rule.write_to.is_empty() {
            vec![None]
        } else {
            rule.write_to
                .iter()
                .filter_map(|name| targets.get(name).cloned())
                .map(Some)
                .collect()
        };

        for level in rule.enabled_levels().into_iter().filter(|level| *level >= threshold) {
            for target in &rule_targets {
                routes.push((
                    level,
                    RouteSpec {
                        target: target.clone(),
                        filters: chain.clone(),
                        logger: logger.clone(),
                        rule: index,
                        is_final: rule.is_final,
                    },
                ));
            }
        }
    }

    Ok(RoutingTable::build(generation, routes, targets))
}
