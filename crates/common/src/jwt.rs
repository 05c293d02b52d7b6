//! JWT utilities shared across the gate's components.
//!
//! This module provides the transport-independent pieces of token handling:
//! - Size limits for DoS prevention
//! - Clock skew bounds for temporal claim validation
//! - Compact-serialization header decoding (`alg`, `kid`)
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Header decoding does NOT verify the signature; the decoded `kid` may only
//!   be used to select a key from a trusted key set
//! - Error messages are intentionally generic to prevent information leakage
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{decode_header, MAX_JWT_SIZE_BYTES};
//!
//! let header = decode_header(token)?;
//! let key = resolver.resolve(&header.kid).await?;
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// JWTs larger than this size are rejected BEFORE any parsing or cryptographic
/// operations.
///
/// # Rationale
///
/// - Typical access tokens are 500-1500 bytes (Keycloak RS256 tokens with
///   realm roles sit near the upper end)
/// - 8KB allows for large role/group claims while bounding decode work
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Default JWT clock skew tolerance: none.
///
/// No leeway is granted on `exp`/`nbf` unless explicitly configured.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(0);

/// Maximum allowed JWT clock skew tolerance (10 minutes).
///
/// Prevents misconfiguration that would keep expired tokens alive.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// Number of dot-separated segments in a compact JWS.
const JWT_SEGMENTS: usize = 3;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while decoding a token header.
///
/// Note: Error messages are intentionally generic to prevent information leakage.
/// Detailed information is logged at debug level for troubleshooting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure).
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Token is missing required `kid` header.
    #[error("The access token is invalid or expired")]
    MissingKid,
}

// =============================================================================
// Header
// =============================================================================

/// The fields of a JOSE header the gate acts on.
///
/// `alg` is kept as the raw string so the caller can match it exactly against
/// its allow-list; no normalization happens here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    /// Declared signature algorithm, verbatim.
    pub alg: String,

    /// Key ID selecting the verification key.
    pub kid: String,
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
    #[serde(default)]
    kid: Option<serde_json::Value>,
}

/// Decode the header of a compact-serialized JWT without verifying it.
///
/// # Security
///
/// - Token size is checked BEFORE any parsing (denial-of-service prevention)
/// - Exactly three segments are required; anything else is malformed
/// - This function does NOT validate the token signature
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Wrong segment count, bad base64url, invalid JSON, or
///   no string `alg`
/// - `MissingKid` - Header has no `kid`, or `kid` is not a non-empty string
pub fn decode_header(token: &str) -> Result<TokenHeader, JwtValidationError> {
    // Check token size first (DoS prevention)
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    // JWT format: header.payload.signature
    let segments = token.split('.').count();
    if segments != JWT_SEGMENTS {
        tracing::debug!(
            target: "common.jwt",
            segments,
            "Token rejected: invalid JWT format"
        );
        return Err(JwtValidationError::MalformedToken);
    }

    let header_part = token
        .split('.')
        .next()
        .ok_or(JwtValidationError::MalformedToken)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let header: RawHeader = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    // kid must be a non-empty string; numbers/null are not coerced
    let kid = header
        .kid
        .as_ref()
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MissingKid)?;

    Ok(TokenHeader {
        alg: header.alg,
        kid,
    })
}

// =============================================================================
// Tests
// =============================================================================
