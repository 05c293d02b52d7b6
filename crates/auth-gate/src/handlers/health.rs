//! Liveness probe.

/// Handler for GET /health
///
/// Does not touch the authority: a gate whose key endpoint is down is still
/// alive, it just answers 500 on `/authorize`.
#[tracing::instrument(skip_all, name = "gate.health.check")]
pub async fn health_check() -> &'static str {
    "OK"
}
