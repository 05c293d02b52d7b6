//! Authorization decision engine.
//!
//! Turns one request into exactly one [`AuthorizationDecision`]:
//!
//! ```text
//! header lookup -> "Bearer " scheme check -> token validation -> decision
//! ```
//!
//! This is the only layer that knows about status codes and response bodies.
//! It is also the only layer that logs above DEBUG, and only for
//! [`AuthorizationDecision::ServerError`].

use crate::auth::jwt::{InvalidReason, TokenValidator, ValidationOutcome};
use crate::errors::KeyFetchError;
use crate::observability::metrics;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

/// Header carrying the credential, matched case-insensitively.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Scheme prefix, matched case-sensitively including the single space.
pub const BEARER_PREFIX: &str = "Bearer ";

/// An inbound request, reduced to what the gate looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthRequest {
    /// Header name to value. Names may arrive in any case.
    pub headers: HashMap<String, String>,
}

impl AuthRequest {
    pub fn new(headers: HashMap<String, String>) -> Self {
        Self { headers }
    }

    /// Value of the `Authorization` header, if any.
    ///
    /// Empty values count as absent. If several names match (differing only
    /// in case), the value under the byte-wise smallest name wins.
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .iter()
            .filter(|(name, value)| {
                name.eq_ignore_ascii_case(AUTHORIZATION_HEADER) && !value.is_empty()
            })
            .min_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()))
            .map(|(_, value)| value.as_str())
    }
}

impl From<HashMap<String, String>> for AuthRequest {
    fn from(headers: HashMap<String, String>) -> Self {
        Self::new(headers)
    }
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedReason {
    MissingHeader,
    InvalidHeaderFormat,
    /// The token was examined and rejected. The inner reason is diagnostic.
    InvalidToken(InvalidReason),
}

/// Final decision for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationDecision {
    Authorized,
    Unauthorized(UnauthorizedReason),
    /// Token validity could not be determined.
    ServerError(KeyFetchError),
}

impl AuthorizationDecision {
    pub fn status_code(&self) -> u16 {
        match self {
            AuthorizationDecision::Authorized => 200,
            AuthorizationDecision::Unauthorized(_) => 401,
            AuthorizationDecision::ServerError(_) => 500,
        }
    }

    /// Response body. One of five fixed strings; never carries error detail.
    pub fn body(&self) -> &'static str {
        match self {
            AuthorizationDecision::Authorized => "success",
            AuthorizationDecision::Unauthorized(UnauthorizedReason::MissingHeader) => {
                "missing Authorization header"
            }
            AuthorizationDecision::Unauthorized(UnauthorizedReason::InvalidHeaderFormat) => {
                "invalid Authorization header format"
            }
            AuthorizationDecision::Unauthorized(UnauthorizedReason::InvalidToken(_)) => {
                "invalid token"
            }
            AuthorizationDecision::ServerError(_) => "failed to validate token",
        }
    }

    /// Metric labels: (`outcome`, `reason`).
    fn labels(&self) -> (&'static str, &'static str) {
        match self {
            AuthorizationDecision::Authorized => ("authorized", "valid"),
            AuthorizationDecision::Unauthorized(UnauthorizedReason::MissingHeader) => {
                ("unauthorized", "missing_header")
            }
            AuthorizationDecision::Unauthorized(UnauthorizedReason::InvalidHeaderFormat) => {
                ("unauthorized", "invalid_header_format")
            }
            AuthorizationDecision::Unauthorized(UnauthorizedReason::InvalidToken(reason)) => {
                ("unauthorized", reason.as_str())
            }
            AuthorizationDecision::ServerError(e) => ("server_error", e.kind()),
        }
    }
}

/// Maps requests to decisions using a shared [`TokenValidator`].
#[derive(Clone)]
pub struct DecisionEngine {
    validator: Arc<TokenValidator>,
}

impl DecisionEngine {
    pub fn new(validator: Arc<TokenValidator>) -> Self {
        Self { validator }
    }

    /// Decide one request.
    ///
    /// Terminal on the first failing step. Emits the single ERROR log entry
    /// for the `ServerError` path.
    #[instrument(skip_all, name = "gate.decision")]
    pub async fn decide(&self, request: &AuthRequest) -> AuthorizationDecision {
        let decision = self.evaluate(request).await;

        if let AuthorizationDecision::ServerError(e) = &decision {
            tracing::error!(target: "gate.decision", error = %e, "token validation failed");
        }

        let (outcome, reason) = decision.labels();
        metrics::record_decision(outcome, reason);

        decision
    }

    async fn evaluate(&self, request: &AuthRequest) -> AuthorizationDecision {
        let Some(header) = request.authorization() else {
            tracing::debug!(target: "gate.decision", "Missing Authorization header");
            return AuthorizationDecision::Unauthorized(UnauthorizedReason::MissingHeader);
        };

        let Some(token) = header.strip_prefix(BEARER_PREFIX) else {
            tracing::debug!(target: "gate.decision", "Invalid Authorization header format");
            return AuthorizationDecision::Unauthorized(UnauthorizedReason::InvalidHeaderFormat);
        };

        match self.validator.validate(token).await {
            ValidationOutcome::Valid(_) => AuthorizationDecision::Authorized,
            ValidationOutcome::Invalid(reason) => {
                AuthorizationDecision::Unauthorized(UnauthorizedReason::InvalidToken(reason))
            }
            ValidationOutcome::TransientError(e) => AuthorizationDecision::ServerError(e),
        }
    }
}
