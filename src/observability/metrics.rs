//! Metrics collection and exposition.
//!
//! # Metrics
//! - `hotlog_events_dispatched_total` (counter): events routed, by level
//! - `hotlog_target_invocations_total` (counter): target writes, by level
//! - `hotlog_target_emit_failures_total` (counter): failed writes, by target
//! - `hotlog_filter_errors_total` (counter): filters that failed or panicked
//! - `hotlog_config_reloads_total` (counter): reload attempts, by outcome
//! - `hotlog_config_generation` (gauge): generation of the published table

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::event::SeverityLevel;

/// Install the Prometheus recorder and its scrape endpoint. Must be called
/// from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_dispatch(level: SeverityLevel, invoked: usize) {
    let level = level.as_str();
    ::metrics::counter!("hotlog_events_dispatched_total", "level" => level).increment(1);
    if invoked > 0 {
        ::metrics::counter!("hotlog_target_invocations_total", "level" => level).increment(invoked as u64);
    }
}

pub fn record_emit_failure(target: &str) {
    ::metrics::counter!("hotlog_target_emit_failures_total", "target" => target.to_string()).increment(1);
}

pub fn record_filter_error() {
    ::metrics::counter!("hotlog_filter_errors_total").increment(1);
}

pub fn record_reload(outcome: &'static str) {
    ::metrics::counter!("hotlog_config_reloads_total", "outcome" => outcome).increment(1);
}

pub fn set_generation(generation: u64) {
    ::metrics::gauge!("hotlog_config_generation").set(generation as f64);
}
