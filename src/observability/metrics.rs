//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by operation, status
//! - `relay_request_duration_seconds` (histogram): latency by operation
//! - `relay_channels` (gauge): registered channels
//! - `relay_messages_posted_total` (counter): messages queued, by category
//! - `relay_messages_delivered_total` (counter): messages popped, by category
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op (tests, disabled config)
//! - Labels are low-cardinality: never channel ids or paths

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::relay::Category;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled request.
pub fn record_request(op: &'static str, status: u16, start: Instant) {
    counter!("relay_requests_total", "op" => op, "status" => status.to_string()).increment(1);
    histogram!("relay_request_duration_seconds", "op" => op).record(start.elapsed().as_secs_f64());
}

pub fn set_channel_count(count: usize) {
    gauge!("relay_channels").set(count as f64);
}

pub fn record_posted(category: Category) {
    counter!("relay_messages_posted_total", "category" => category.as_str()).increment(1);
}

pub fn record_delivered(category: Category) {
    counter!("relay_messages_delivered_total", "category" => category.as_str()).increment(1);
}
