// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the webhook solver.
//!
//! This module provides metrics collection with the namespace prefix
//! `henet_webhook`.
//!
//! # Metrics Categories
//!
//! - **Challenge Metrics** - Present/clean-up calls and their outcomes
//! - **Provider Metrics** - What the dynamic DNS API answered and how long it took
//!
//! # Example
//!
//! ```rust,no_run
//! use henet_webhook::metrics::record_challenge;
//!
//! record_challenge("present", "success", std::time::Duration::from_millis(420));
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all webhook metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "henet_webhook";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Challenge Metrics
// ============================================================================

/// Total number of challenges handled by action and result
///
/// Labels:
/// - `action`: `present` or `cleanup`
/// - `result`: `success` or the failure reason (e.g., `ProviderAuthFailed`)
pub static CHALLENGES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_challenges_total"),
        "Total number of challenges handled by action and result",
    );
    let counter = CounterVec::new(opts, &["action", "result"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of challenges in seconds, including the secret read
///
/// Labels:
/// - `action`: `present` or `cleanup`
pub static CHALLENGE_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_challenge_duration_seconds"),
        "Duration of challenges in seconds by action",
    )
    .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]);
    let histogram = HistogramVec::new(opts, &["action"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Provider Metrics
// ============================================================================

/// Total number of provider answers by classification
///
/// Labels:
/// - `result`: `good`, `nochg`, `badauth`, `unexpected`, `http_error`, `transport_error`
pub static PROVIDER_RESPONSES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_provider_responses_total"),
        "Total number of dynamic DNS API answers by classification",
    );
    let counter = CounterVec::new(opts, &["result"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of dynamic DNS API calls in seconds
///
/// Labels:
/// - `result`: same classification as [`PROVIDER_RESPONSES_TOTAL`]
pub static PROVIDER_REQUEST_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_provider_request_duration_seconds"),
        "Duration of dynamic DNS API calls in seconds by classification",
    )
    .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]);
    let histogram = HistogramVec::new(opts, &["result"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a finished challenge
///
/// # Arguments
/// * `action` - `present` or `cleanup`
/// * `result` - `success` or a failure reason
/// * `duration` - Time spent handling the challenge
pub fn record_challenge(action: &str, result: &str, duration: Duration) {
    CHALLENGES_TOTAL.with_label_values(&[action, result]).inc();
    CHALLENGE_DURATION_SECONDS
        .with_label_values(&[action])
        .observe(duration.as_secs_f64());
}

/// Record how the provider answered and how long it took
pub fn record_provider_response(result: &str, duration: Duration) {
    PROVIDER_RESPONSES_TOTAL.with_label_values(&[result]).inc();
    PROVIDER_REQUEST_DURATION_SECONDS
        .with_label_values(&[result])
        .observe(duration.as_secs_f64());
}

/// Gather all metrics in Prometheus text format
///
/// # Returns
/// Prometheus-formatted metrics as a String
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
