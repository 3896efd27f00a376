//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    DELIVERY_EVENTS_TOTAL, DISPATCH_DURATION_SECONDS, DISPATCH_FAILURES_TOTAL, DISPATCH_IN_FLIGHT,
    DISPATCH_SKIPPED_TOTAL, MESSAGES_QUEUED_TOTAL, PREVIEWS_TOTAL, SENDS_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording campaign dispatch metrics
pub struct DispatchMetrics;

impl DispatchMetrics {
    /// Record a send where every customer got a message
    pub fn record_completed(duration_secs: f64) {
        SENDS_TOTAL.with_label_values(&["completed"]).inc();
        DISPATCH_DURATION_SECONDS.observe(duration_secs);
    }

    /// Record a send that stopped on a failure
    pub fn record_partial(duration_secs: f64) {
        SENDS_TOTAL.with_label_values(&["partial"]).inc();
        DISPATCH_DURATION_SECONDS.observe(duration_secs);
    }

    /// Record a send that never started (validation or campaign lookup)
    pub fn record_rejected() {
        SENDS_TOTAL.with_label_values(&["rejected"]).inc();
    }

    /// Record one persisted outbound message
    pub fn record_queued() {
        MESSAGES_QUEUED_TOTAL.inc();
    }

    /// Record a failed per-customer task; `reason` is `not_found` or `internal`
    pub fn record_failure(reason: &str) {
        DISPATCH_FAILURES_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record a per-customer task skipped after cancellation
    pub fn record_skipped() {
        DISPATCH_SKIPPED_TOTAL.inc();
    }

    pub fn task_started() {
        DISPATCH_IN_FLIGHT.inc();
    }

    pub fn task_finished() {
        DISPATCH_IN_FLIGHT.dec();
    }
}

/// Helper struct for recording preview metrics
pub struct PreviewMetrics;

impl PreviewMetrics {
    pub fn record_preview() {
        PREVIEWS_TOTAL.inc();
    }
}

/// Helper struct for recording delivery hand-off metrics
pub struct DeliveryMetrics;

impl DeliveryMetrics {
    /// Record an event accepted by the delivery channel
    pub fn record_handed_off() {
        DELIVERY_EVENTS_TOTAL.with_label_values(&["handed_off"]).inc();
    }

    /// Record an event the delivery channel could not accept
    pub fn record_dropped() {
        DELIVERY_EVENTS_TOTAL.with_label_values(&["dropped"]).inc();
    }

    /// Record an event consumed by the delivery worker
    pub fn record_processed() {
        DELIVERY_EVENTS_TOTAL.with_label_values(&["processed"]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_metrics_recorded() {
        let before = MESSAGES_QUEUED_TOTAL.get();
        DispatchMetrics::record_queued();
        assert!(MESSAGES_QUEUED_TOTAL.get() >= before + 1);

        let skipped = DISPATCH_SKIPPED_TOTAL.get();
        DispatchMetrics::record_skipped();
        assert!(DISPATCH_SKIPPED_TOTAL.get() > skipped);
    }

    #[test]
    fn test_encode_metrics() {
        DispatchMetrics::record_failure("not_found");
        PreviewMetrics::record_preview();

        let output = encode_metrics().unwrap();
        assert!(output.contains("campaign_dispatch_failures_total"));
        assert!(output.contains("campaign_previews_total"));
    }
}
