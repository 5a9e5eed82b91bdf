//! Prometheus metrics for observability.
//!
//! This module provides the server-side metrics:
//! - HTTP request metrics (latency, counts, auth failures)
//! - Catalog and refresh state (collected dynamically at scrape time)
//!
//! Crawl and refresh counters live in `shelfscan_core::metrics` and are
//! registered here too, so one registry serves everything.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "shelfscan_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shelfscan_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "shelfscan_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures on gated routes.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "shelfscan_auth_failures_total",
            "Total authentication failures",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Catalog Metrics (collected dynamically)
// =============================================================================

/// Id of the generation currently served.
pub static CATALOG_GENERATION: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "shelfscan_catalog_generation",
        "Id of the currently published catalog generation",
    )
    .unwrap()
});

/// Refresh running state (1 = running, 0 = idle).
pub static REFRESH_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "shelfscan_refresh_running",
        "Whether a catalog refresh is running (1) or not (0)",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();

    // Catalog
    registry
        .register(Box::new(CATALOG_GENERATION.clone()))
        .unwrap();
    registry
        .register(Box::new(REFRESH_RUNNING.clone()))
        .unwrap();

    // Core metrics (crawler, refresh)
    for metric in shelfscan_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Update gauges from current application state before a scrape.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    REFRESH_RUNNING.set(i64::from(state.orchestrator().is_running()));

    if let Ok(stats) = state.engine().stats() {
        CATALOG_GENERATION.set(stats.generation as i64);
    }
}

static RECORD_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/[0-9a-fA-F]{16}(/|$)").unwrap());

/// Normalize a path for metric labels (replace record ids with a placeholder).
pub fn normalize_path(path: &str) -> String {
    RECORD_ID.replace_all(path, "/{id}$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_record_id() {
        let path = "/api/v1/books/0123456789abcdef";
        assert_eq!(normalize_path(path), "/api/v1/books/{id}");
    }

    #[test]
    fn test_normalize_path_keeps_other_segments() {
        assert_eq!(normalize_path("/api/v1/health"), "/api/v1/health");
        assert_eq!(normalize_path("/api/v1/refresh/status"), "/api/v1/refresh/status");
        // Too short to be a record id.
        assert_eq!(normalize_path("/api/v1/books/abc123"), "/api/v1/books/abc123");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics().unwrap();
        assert!(output.contains("shelfscan_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        CATALOG_GENERATION.set(0);
        REFRESH_RUNNING.set(0);
        shelfscan_core::metrics::PAGES_FETCHED.inc_by(0);
        shelfscan_core::metrics::REFRESHES
            .with_label_values(&["published"])
            .inc_by(0);

        let output = encode_metrics().unwrap();

        assert!(output.contains("shelfscan_http_request_duration_seconds"));
        assert!(output.contains("shelfscan_catalog_generation"));
        assert!(output.contains("shelfscan_refresh_running"));
        assert!(output.contains("shelfscan_pages_fetched_total"));
        assert!(output.contains("shelfscan_refreshes_total"));
    }
}
