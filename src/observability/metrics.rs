//! Metrics collection and exposition.
//!
//! # Metrics
//! - `balancer_requests_total` (counter): `get` calls by outcome
//! - `balancer_online_providers` (gauge): online slots after the last change
//! - `balancer_permits_granted` (gauge): permit units granted (slots × parallel requests)
//! - `balancer_health_transitions_total` (counter): status changes by target status
//! - `balancer_monitor_corruptions_total` (counter): failed permit reconciliations
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed (see [`init_metrics`]).

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::health::state::SlotStatus;

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record the outcome of one `get` call.
pub fn record_request(outcome: &'static str) {
    metrics::counter!("balancer_requests_total", "outcome" => outcome).increment(1);
}

/// Record the current online/permit picture.
pub fn record_capacity(online: usize, permits: usize) {
    metrics::gauge!("balancer_online_providers").set(online as f64);
    metrics::gauge!("balancer_permits_granted").set(permits as f64);
}

/// Record a slot status change.
pub fn record_transition(to: SlotStatus) {
    metrics::counter!("balancer_health_transitions_total", "to" => to.as_str()).increment(1);
}

pub fn record_corruption() {
    metrics::counter!("balancer_monitor_corruptions_total").increment(1);
}
