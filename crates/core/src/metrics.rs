//! Prometheus metrics for the resolver.
//!
//! This module provides metrics for:
//! - Resolution runs (outcome, duration)
//! - Secondary-source traffic (search queries, detail fetches)
//! - Listing screening

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Resolution Metrics
// =============================================================================

/// Resolution runs by outcome.
pub static RESOLUTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("coverscout_resolutions_total", "Total resolution runs"),
        &["outcome"], // "confirmed", "legacy", "none", "cancelled", "skipped"
    )
    .unwrap()
});

/// Resolution duration in seconds.
pub static RESOLUTION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "coverscout_resolution_duration_seconds",
            "Duration of a resolution run",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Candidate titles generated per resolution.
pub static CANDIDATES_GENERATED: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "coverscout_candidates_generated",
            "Number of candidate titles generated per resolution",
        )
        .buckets(vec![1.0, 2.0, 4.0, 8.0, 16.0, 32.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Secondary Source Metrics
// =============================================================================

/// Search queries issued.
pub static SEARCH_QUERIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "coverscout_search_queries_total",
        "Total search queries issued",
    )
    .unwrap()
});

/// Collaborator failures by operation.
pub static SOURCE_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "coverscout_source_errors_total",
            "Secondary source failures treated as empty results",
        ),
        &["operation"], // "search", "fetch_detail", "probe_image"
    )
    .unwrap()
});

/// Detail checks by verdict.
pub static DETAIL_CHECKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("coverscout_detail_checks_total", "Total detail page checks"),
        &["verdict"],
    )
    .unwrap()
});

// =============================================================================
// Screening Metrics
// =============================================================================

/// Listings rejected by reason.
pub static LISTINGS_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "coverscout_listings_rejected_total",
            "Listings rejected before or at title comparison",
        ),
        &["reason"],
    )
    .unwrap()
});

/// Get all metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Resolution
        Box::new(RESOLUTIONS_TOTAL.clone()),
        Box::new(RESOLUTION_DURATION.clone()),
        Box::new(CANDIDATES_GENERATED.clone()),
        // Secondary source
        Box::new(SEARCH_QUERIES.clone()),
        Box::new(SOURCE_ERRORS.clone()),
        Box::new(DETAIL_CHECKS.clone()),
        // Screening
        Box::new(LISTINGS_REJECTED.clone()),
    ]
}
