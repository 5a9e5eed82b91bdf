//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Crawler (pages fetched, fetch failures, entry normalization)
//! - Refresh orchestrator (outcomes, duration, duplicates, published size)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Crawler Metrics
// =============================================================================

/// Pages fetched successfully.
pub static PAGES_FETCHED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("shelfscan_pages_fetched_total", "Total listing pages fetched").unwrap()
});

/// Fetch failures by kind.
pub static FETCH_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shelfscan_fetch_failures_total", "Total failed page fetches"),
        &["kind"], // "timeout", "connection", "status", "body", "client"
    )
    .unwrap()
});

/// Entries rejected by the normalizer, by offending field.
pub static NORMALIZATION_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "shelfscan_normalization_failures_total",
            "Total raw entries dropped during normalization",
        ),
        &["field"],
    )
    .unwrap()
});

// =============================================================================
// Refresh Metrics
// =============================================================================

/// Refresh attempts by result.
pub static REFRESHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shelfscan_refreshes_total", "Total catalog refreshes"),
        &["result"], // "published", "failed", "rejected"
    )
    .unwrap()
});

/// Refresh duration in seconds.
pub static REFRESH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "shelfscan_refresh_duration_seconds",
            "Duration of a full crawl and publish",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["result"],
    )
    .unwrap()
});

/// Duplicate records dropped at seal time.
pub static DUPLICATES_DROPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "shelfscan_duplicates_dropped_total",
        "Total records dropped for sharing a detail URL",
    )
    .unwrap()
});

/// Records in the currently published generation.
pub static PUBLISHED_RECORDS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "shelfscan_published_records",
        "Number of records in the published generation",
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Crawler
        Box::new(PAGES_FETCHED.clone()),
        Box::new(FETCH_FAILURES.clone()),
        Box::new(NORMALIZATION_FAILURES.clone()),
        // Refresh
        Box::new(REFRESHES.clone()),
        Box::new(REFRESH_DURATION.clone()),
        Box::new(DUPLICATES_DROPPED.clone()),
        Box::new(PUBLISHED_RECORDS.clone()),
    ]
}
