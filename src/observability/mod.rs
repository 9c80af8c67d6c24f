//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! http::server, relay::handlers, relay::channel
//!     → logging.rs (tracing events, one span per request with its x-request-id)
//!     → metrics.rs (request counts/latency, channel gauge, message counters)
//!
//! Sinks:
//!     → stdout via tracing-subscriber fmt layer
//!     → Prometheus exporter (only when observability.metrics_enabled)
//! ```
//!
//! # Design Decisions
//! - Metric labels never carry channel ids, keys or paths

pub mod logging;
pub mod metrics;
