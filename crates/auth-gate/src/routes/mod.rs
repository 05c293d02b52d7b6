//! HTTP routes for the auth gate.
//!
//! Defines the Axum router and application state.

use crate::auth::{JwksClient, TokenValidator};
use crate::config::Config;
use crate::decision::DecisionEngine;
use crate::handlers;
use axum::{
    routing::{any, get},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    timeout::TimeoutLayer,
    trace::{DefaultOnFailure, TraceLayer},
};
use tracing::Level;

/// Request timeout when the key-set fetch timeout is short.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Headroom the request timeout keeps over the key-set fetch timeout.
pub const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Key-set client, shared with the engine's validator.
    pub jwks_client: Arc<JwksClient>,

    /// Request to decision.
    pub engine: DecisionEngine,
}

impl AppState {
    /// Wire the key resolver, validator and engine from configuration.
    ///
    /// Performs no I/O; the first key-set fetch happens on the first lookup.
    pub fn new(config: Config) -> Self {
        let jwks_client = Arc::new(JwksClient::with_options(
            config.jwks_url.clone(),
            config.jwks_options(),
        ));
        let validator = Arc::new(TokenValidator::new(
            jwks_client.clone(),
            config.validation_settings(),
        ));

        Self {
            config,
            jwks_client,
            engine: DecisionEngine::new(validator),
        }
    }
}

/// Router-level timeout for `config`.
///
/// Always strictly above the key-set fetch timeout, so a hung authority
/// surfaces as the fetch's `Timeout` (500) rather than a router 408.
pub fn request_timeout(config: &Config) -> Duration {
    DEFAULT_REQUEST_TIMEOUT.max(config.jwks_fetch_timeout + REQUEST_TIMEOUT_MARGIN)
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/authorize` - Authorization decision, any method
/// - `/health` - Liveness probe (simple "OK")
/// - `/metrics` - Prometheus metrics endpoint
/// - TraceLayer for request logging
/// - Request timeout from [`request_timeout`]
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let timeout = request_timeout(&state.config);

    let gate_routes = Router::new()
        .route("/authorize", any(handlers::authorize))
        .route("/health", get(handlers::health_check))
        .with_state(state);

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details. 5xx responses stay at DEBUG: the
    //    decision engine already emits the one ERROR entry for them.
    gate_routes
        .merge(metrics_routes)
        .layer(
            TraceLayer::new_for_http()
                .on_failure(DefaultOnFailure::new().level(Level::DEBUG)),
        )
        .layer(TimeoutLayer::new(timeout))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn test_app_state_uses_configured_jwks_url() {
        let vars = HashMap::from([
            ("KEYCLOAK_URL".to_string(), "http://kc.local:8080".to_string()),
            ("KEYCLOAK_REALM".to_string(), "demo".to_string()),
            ("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), "3".to_string()),
        ]);
        let config = Config::from_vars(&vars).unwrap();

        let state = AppState::new(config);

        assert_eq!(
            state.jwks_client.jwks_url(),
            "http://kc.local:8080/realms/demo/protocol/openid-connect/certs"
        );
        assert_eq!(
            state.jwks_client.options().fetch_timeout,
            Duration::from_secs(3)
        );
    }

    #[test]
    fn test_request_timeout_exceeds_fetch_timeout() {
        for seconds in ["1", "10", "25", "26", "31", "45", "60"] {
            let vars = HashMap::from([
                ("JWKS_URL".to_string(), "http://kc.local/certs".to_string()),
                ("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), seconds.to_string()),
            ]);
            let config = Config::from_vars(&vars).unwrap();

            let timeout = request_timeout(&config);

            assert!(timeout > config.jwks_fetch_timeout, "fetch timeout {seconds}s");
            assert!(timeout >= DEFAULT_REQUEST_TIMEOUT);
        }
    }
}
