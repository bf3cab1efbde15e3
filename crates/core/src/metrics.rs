//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Ingestion (items observed, scanner restarts and errors)
//! - Resolution and routing (resolved, dropped, appended)
//! - External services (catalog and playlist API calls)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Ingestion Metrics
// =============================================================================

/// Items handed to the dispatcher.
pub static ITEMS_INGESTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("dissic_items_ingested_total", "Total posts observed").unwrap()
});

/// Scan sessions started by the supervisor.
pub static SCAN_SESSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("dissic_scan_sessions_total", "Scan session start attempts"),
        &["result"], // "started", "failed"
    )
    .unwrap()
});

/// Errors reported by running scan sessions.
pub static SCAN_ERRORS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("dissic_scan_errors_total", "Scan sessions that ended with an error").unwrap()
});

/// Current consecutive scan failure count.
pub static SCAN_FAILURE_STREAK: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "dissic_scan_failure_streak",
        "Consecutive scan failures since the last healthy session",
    )
    .unwrap()
});

// =============================================================================
// Resolution and Routing Metrics
// =============================================================================

/// Items resolved to a track, by method.
pub static ITEMS_RESOLVED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("dissic_items_resolved_total", "Items resolved to a track"),
        &["method"], // "url", "title"
    )
    .unwrap()
});

/// Items dropped, by reason.
pub static ITEMS_DROPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("dissic_items_dropped_total", "Items dropped without an append"),
        &["reason"], // "not_found", "unsupported_url", "catalog_error", "no_destination", "append_failed", "shutdown"
    )
    .unwrap()
});

/// Playlist appends, by result.
pub static APPENDS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("dissic_appends_total", "Playlist append attempts"),
        &["result"], // "appended", "already_exists", "failed"
    )
    .unwrap()
});

/// Items currently being resolved.
pub static ITEMS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("dissic_items_in_flight", "Items currently being processed").unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "dissic_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service", "operation"],
    )
    .unwrap()
});

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "dissic_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Record the outcome and duration of one external call.
pub fn record_external_call(service: &str, operation: &str, success: bool, seconds: f64) {
    EXTERNAL_SERVICE_DURATION
        .with_label_values(&[service, operation])
        .observe(seconds);
    EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&[service, operation, if success { "success" } else { "error" }])
        .inc();
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Ingestion
        Box::new(ITEMS_INGESTED.clone()),
        Box::new(SCAN_SESSIONS.clone()),
        Box::new(SCAN_ERRORS.clone()),
        Box::new(SCAN_FAILURE_STREAK.clone()),
        // Resolution and routing
        Box::new(ITEMS_RESOLVED.clone()),
        Box::new(ITEMS_DROPPED.clone()),
        Box::new(APPENDS.clone()),
        Box::new(ITEMS_IN_FLIGHT.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn test_all_metrics_register_cleanly() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        ITEMS_INGESTED.inc();
        assert!(!registry.gather().is_empty());
    }

    #[test]
    fn test_record_external_call() {
        let before = EXTERNAL_SERVICE_REQUESTS
            .with_label_values(&["test", "op", "error"])
            .get();
        record_external_call("test", "op", false, 0.1);
        let after = EXTERNAL_SERVICE_REQUESTS
            .with_label_values(&["test", "op", "error"])
            .get();
        assert_eq!(after, before + 1);
    }
}
