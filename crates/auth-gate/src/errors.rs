//! Key resolution error types.
//!
//! These never carry HTTP semantics. The decision engine is the only place
//! that turns them into a status code, and the detail they carry is logged
//! server-side, never returned to the caller.

use thiserror::Error;

/// Failure to obtain a usable key set from the authority.
///
/// Every variant is a system fault: the token's validity could not be
/// determined. The type is `Clone` so a single fetch failure can be handed
/// to every caller that was waiting on that fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyFetchError {
    /// Connection or transport failure.
    #[error("JWKS request failed: {0}")]
    Request(String),

    /// The fetch did not complete within the configured timeout.
    #[error("JWKS request timed out")]
    Timeout,

    /// The endpoint answered with a non-success status.
    #[error("JWKS endpoint returned status {0}")]
    Status(u16),

    /// The body is not a key-set document.
    #[error("JWKS response is malformed: {0}")]
    Malformed(String),
}

impl KeyFetchError {
    /// Bounded label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            KeyFetchError::Request(_) => "request",
            KeyFetchError::Timeout => "timeout",
            KeyFetchError::Status(_) => "status",
            KeyFetchError::Malformed(_) => "malformed",
        }
    }
}

/// Failure to resolve a key identifier to a verification key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyResolveError {
    /// The kid is absent from the authority's current key set.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// The key set could not be fetched.
    #[error(transparent)]
    Fetch(#[from] KeyFetchError),
}
