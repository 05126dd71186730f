//! Prometheus Metrics Module
//!
//! Provides gateway-client metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Heartbeat round-trip latency histogram
//! - Reconnect counter
//! - Dispatch event counts by event name
//! - Connection state gauge

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, GaugeVec, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Heartbeat latency histogram - time from heartbeat send to ACK in seconds
pub static HEARTBEAT_LATENCY_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    let buckets = vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    Histogram::with_opts(
        HistogramOpts::new(
            "heartbeat_latency_seconds",
            "Gateway heartbeat round-trip latency in seconds",
        )
        .namespace("gateway_client")
        .buckets(buckets),
    )
    .expect("Failed to create HEARTBEAT_LATENCY_SECONDS metric")
});

/// Reconnect counter - every recoverable disconnect that led to a new attempt
pub static RECONNECTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("reconnects_total", "Total number of gateway reconnect attempts")
            .namespace("gateway_client"),
    )
    .expect("Failed to create RECONNECTS_TOTAL metric")
});

/// Dispatch counter - tracks received dispatch events by name
pub static DISPATCH_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("dispatch_events_total", "Total number of dispatch events received")
            .namespace("gateway_client"),
        &["event"],
    )
    .expect("Failed to create DISPATCH_EVENTS_TOTAL metric")
});

/// Connection state gauge - 1 for the current state, 0 otherwise
pub static CONNECTION_STATE: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new("connection_state", "Current gateway connection state")
            .namespace("gateway_client"),
        &["state"], // "idle", "connecting", "authenticating", "ready", "closed"
    )
    .expect("Failed to create CONNECTION_STATE metric")
});

const STATES: [&str; 5] = ["idle", "connecting", "authenticating", "ready", "closed"];

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HEARTBEAT_LATENCY_SECONDS.clone()))
        .expect("Failed to register HEARTBEAT_LATENCY_SECONDS");
    registry
        .register(Box::new(RECONNECTS_TOTAL.clone()))
        .expect("Failed to register RECONNECTS_TOTAL");
    registry
        .register(Box::new(DISPATCH_EVENTS_TOTAL.clone()))
        .expect("Failed to register DISPATCH_EVENTS_TOTAL");
    registry
        .register(Box::new(CONNECTION_STATE.clone()))
        .expect("Failed to register CONNECTION_STATE");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn record_heartbeat_latency(latency_secs: f64) {
    HEARTBEAT_LATENCY_SECONDS.observe(latency_secs);
}

pub fn record_reconnect() {
    RECONNECTS_TOTAL.inc();
}

pub fn record_dispatch(event: &str) {
    DISPATCH_EVENTS_TOTAL.with_label_values(&[event]).inc();
}

/// Mark `state` as current and clear the others.
pub fn set_connection_state(state: &str) {
    for candidate in STATES {
        let value = if candidate == state { 1.0 } else { 0.0 };
        CONNECTION_STATE.with_label_values(&[candidate]).set(value);
    }
}
