//! Metrics collection and exposition.
//!
//! # Metrics
//! - `policy_applied_total` (counter): documents installed, by category
//! - `policy_rejected_total` (counter): documents that failed to parse, by category
//! - `store_errors_total` (counter): failed reads/subscribes, by category
//! - `resubscribe_total` (counter): resubscribe attempts, by category
//! - `active_subscriptions` (gauge): running watch loops

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::policy::Category;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    metrics::describe_counter!("policy_applied_total", "Policy documents installed");
    metrics::describe_counter!("policy_rejected_total", "Policy documents rejected by the parser");
    metrics::describe_counter!("store_errors_total", "Coordination store read or subscribe failures");
    metrics::describe_counter!("resubscribe_total", "Resubscribe attempts after a stream ended");
    metrics::describe_gauge!("active_subscriptions", "Running watch loops");

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_applied(category: Category) {
    metrics::counter!("policy_applied_total", "category" => category.as_str()).increment(1);
}

pub fn record_rejected(category: Category) {
    metrics::counter!("policy_rejected_total", "category" => category.as_str()).increment(1);
}

pub fn record_store_error(category: Category) {
    metrics::counter!("store_errors_total", "category" => category.as_str()).increment(1);
}

pub fn record_resubscribe(category: Category) {
    metrics::counter!("resubscribe_total", "category" => category.as_str()).increment(1);
}

pub fn subscription_started() {
    metrics::gauge!("active_subscriptions").increment(1.0);
}

pub fn subscription_stopped() {
    metrics::gauge!("active_subscriptions").decrement(1.0);
}
