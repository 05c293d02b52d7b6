//! Metrics definitions for the gate.
//!
//! All metrics follow Prometheus naming conventions:
//! - `gate_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded by code:
//! - `outcome`: authorized, unauthorized, server_error
//! - `reason`: decision reasons and `KeyFetchError::kind` values
//! - `status`: success, error
//! - `error_type`: `KeyFetchError::kind` values

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus recorder and return the handle used to serve
/// `/metrics`.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Bounded by JWKS_FETCH_TIMEOUT_SECONDS (max 60s)
        .set_buckets_for_metric(
            Matcher::Prefix("gate_jwks_fetch".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000, 30.000,
                60.000,
            ],
        )
        .map_err(|e| format!("Failed to set JWKS fetch buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// Decision Metrics
// ============================================================================

/// Record one authorization decision.
///
/// Metric: `gate_decisions_total`
/// Labels: `outcome`, `reason`
pub fn record_decision(outcome: &'static str, reason: &'static str) {
    counter!("gate_decisions_total",
        "outcome" => outcome,
        "reason" => reason
    )
    .increment(1);
}

// ============================================================================
// JWKS Metrics
// ============================================================================

/// Record a completed JWKS fetch.
///
/// Metric: `gate_jwks_fetches_total`, `gate_jwks_fetch_duration_seconds`
/// Labels: `status`, plus `error_type` on failures
pub fn record_jwks_fetch(status: &'static str, error_type: Option<&'static str>, duration: Duration) {
    histogram!("gate_jwks_fetch_duration_seconds").record(duration.as_secs_f64());

    match error_type {
        Some(err_type) => counter!("gate_jwks_fetches_total",
            "status" => status,
            "error_type" => err_type
        )
        .increment(1),
        None => counter!("gate_jwks_fetches_total",
            "status" => status
        )
        .increment(1),
    }
}

/// Set the number of keys in the cached key set.
///
/// Metric: `gate_jwks_cache_keys`
#[allow(clippy::cast_precision_loss)]
pub fn set_cached_keys(count: usize) {
    gauge!("gate_jwks_cache_keys").set(count as f64);
}
