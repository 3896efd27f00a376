//! Prometheus metrics for the campaign messaging service.
//!
//! - Send metrics (outcomes, queued messages, duration)
//! - Dispatch task metrics (failures, skipped tasks, in-flight tasks)
//! - Preview and delivery hand-off metrics

mod helpers;

pub use helpers::{encode_metrics, DeliveryMetrics, DispatchMetrics, PreviewMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "campaign";

lazy_static! {
    // ============================================================================
    // Send Metrics
    // ============================================================================

    /// Campaign sends by outcome
    pub static ref SENDS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_sends_total", METRIC_PREFIX),
        "Total campaign sends by outcome",
        &["outcome"]
    ).unwrap();

    /// Outbound messages persisted by campaign sends
    pub static ref MESSAGES_QUEUED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_queued_total", METRIC_PREFIX),
        "Total outbound messages queued"
    ).unwrap();

    /// Time to dispatch a whole campaign send
    pub static ref DISPATCH_DURATION_SECONDS: Histogram = register_histogram!(
        format!("{}_dispatch_duration_seconds", METRIC_PREFIX),
        "Campaign dispatch duration in seconds",
        vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();

    // ============================================================================
    // Dispatch Task Metrics
    // ============================================================================

    /// Per-customer dispatch failures by reason
    pub static ref DISPATCH_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_dispatch_failures_total", METRIC_PREFIX),
        "Total per-customer dispatch failures",
        &["reason"]
    ).unwrap();

    /// Tasks that skipped their work after a failure cancelled the send
    pub static ref DISPATCH_SKIPPED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_dispatch_skipped_total", METRIC_PREFIX),
        "Total per-customer tasks skipped after cancellation"
    ).unwrap();

    /// Per-customer tasks currently holding a dispatch permit
    pub static ref DISPATCH_IN_FLIGHT: IntGauge = register_int_gauge!(
        format!("{}_dispatch_in_flight", METRIC_PREFIX),
        "Per-customer dispatch tasks currently running"
    ).unwrap();

    // ============================================================================
    // Preview & Delivery Metrics
    // ============================================================================

    /// Personalized previews rendered
    pub static ref PREVIEWS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_previews_total", METRIC_PREFIX),
        "Total personalized message previews"
    ).unwrap();

    /// Delivery hand-off events by result
    pub static ref DELIVERY_EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_delivery_events_total", METRIC_PREFIX),
        "Total delivery hand-off events",
        &["result"]
    ).unwrap();

    /// Seconds since the service started
    pub static ref UPTIME_SECONDS: IntGauge = register_int_gauge!(
        format!("{}_uptime_seconds", METRIC_PREFIX),
        "Service uptime in seconds"
    ).unwrap();
}
