//! Token validation.
//!
//! Verifies a compact JWT against a key obtained from a [`KeyResolver`] and
//! reports one of three outcomes: valid, invalid, or undeterminable.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - The header `alg` must be on the allow-list; `none` and HMAC never are
//! - The resolved key's family (and declared `alg`, if any) must match the header
//! - `exp` is required and checked with the configured leeway; `nbf` when present
//! - Failure detail stays in [`InvalidReason`] and DEBUG logs, never in responses

use crate::auth::claims::Claims;
use crate::auth::keys::KeyResolver;
use crate::errors::{KeyFetchError, KeyResolveError};
use common::jwt::{decode_header, JwtValidationError, DEFAULT_CLOCK_SKEW};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, Validation};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Every asymmetric algorithm the validator can verify.
pub const SUPPORTED_ALGORITHMS: [Algorithm; 9] = [
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
    Algorithm::ES256,
    Algorithm::ES384,
    Algorithm::EdDSA,
];

/// Whether `alg` is one the validator will ever accept.
///
/// HMAC algorithms are excluded: a public key must never be usable as a
/// shared secret.
pub fn is_supported_algorithm(alg: Algorithm) -> bool {
    SUPPORTED_ALGORITHMS.contains(&alg)
}

/// Checks applied on top of signature verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSettings {
    /// Leeway for `exp` and `nbf`.
    pub clock_skew: Duration,

    /// Required `iss` value. `None` skips the check.
    pub expected_issuer: Option<String>,

    /// Accepted `aud` values; a token matches if any of its audiences is
    /// listed. Empty skips the check.
    pub expected_audiences: Vec<String>,

    /// Header algorithms accepted. Entries outside
    /// [`SUPPORTED_ALGORITHMS`] are ignored.
    pub allowed_algorithms: Vec<Algorithm>,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            clock_skew: DEFAULT_CLOCK_SKEW,
            expected_issuer: None,
            expected_audiences: Vec::new(),
            allowed_algorithms: SUPPORTED_ALGORITHMS.to_vec(),
        }
    }
}

/// Why a token was judged invalid. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    TooLarge,
    Malformed,
    MissingKid,
    UnsupportedAlgorithm,
    UnknownKey,
    KeyMismatch,
    BadSignature,
    Expired,
    NotYetValid,
    IssuerMismatch,
    AudienceMismatch,
    InvalidClaims,
}

impl InvalidReason {
    /// Bounded label for metrics and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            InvalidReason::TooLarge => "too_large",
            InvalidReason::Malformed => "malformed",
            InvalidReason::MissingKid => "missing_kid",
            InvalidReason::UnsupportedAlgorithm => "unsupported_algorithm",
            InvalidReason::UnknownKey => "unknown_key",
            InvalidReason::KeyMismatch => "key_mismatch",
            InvalidReason::BadSignature => "bad_signature",
            InvalidReason::Expired => "expired",
            InvalidReason::NotYetValid => "not_yet_valid",
            InvalidReason::IssuerMismatch => "issuer_mismatch",
            InvalidReason::AudienceMismatch => "audience_mismatch",
            InvalidReason::InvalidClaims => "invalid_claims",
        }
    }
}

impl From<JwtValidationError> for InvalidReason {
    fn from(err: JwtValidationError) -> Self {
        match err {
            JwtValidationError::TokenTooLarge => InvalidReason::TooLarge,
            JwtValidationError::MalformedToken => InvalidReason::Malformed,
            JwtValidationError::MissingKid => InvalidReason::MissingKid,
        }
    }
}

impl From<&ErrorKind> for InvalidReason {
    fn from(kind: &ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidSignature => InvalidReason::BadSignature,
            ErrorKind::ExpiredSignature => InvalidReason::Expired,
            ErrorKind::ImmatureSignature => InvalidReason::NotYetValid,
            ErrorKind::InvalidIssuer => InvalidReason::IssuerMismatch,
            ErrorKind::InvalidAudience => InvalidReason::AudienceMismatch,
            ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
                "iss" => InvalidReason::IssuerMismatch,
                "aud" => InvalidReason::AudienceMismatch,
                _ => InvalidReason::InvalidClaims,
            },
            ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::InvalidEcdsaKey => InvalidReason::KeyMismatch,
            ErrorKind::Json(_) | ErrorKind::InvalidSubject => InvalidReason::InvalidClaims,
            _ => InvalidReason::Malformed,
        }
    }
}

/// Result of one validation attempt. Exactly one variant per attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Signature and claims check out.
    Valid(Claims),

    /// The token was examined and rejected.
    Invalid(InvalidReason),

    /// Validity could not be determined because keys were unavailable.
    TransientError(KeyFetchError),
}

/// Internal short-circuit for [`TokenValidator::check`].
enum Rejection {
    Invalid(InvalidReason),
    Transient(KeyFetchError),
}

impl From<InvalidReason> for Rejection {
    fn from(reason: InvalidReason) -> Self {
        Rejection::Invalid(reason)
    }
}

/// JWT validator over any [`KeyResolver`].
pub struct TokenValidator {
    resolver: Arc<dyn KeyResolver>,
    settings: ValidationSettings,
}

impl TokenValidator {
    /// Create a new token validator.
    ///
    /// # Arguments
    ///
    /// * `resolver` - Source of verification keys
    /// * `settings` - Leeway, issuer/audience expectations, algorithm allow-list
    pub fn new(resolver: Arc<dyn KeyResolver>, settings: ValidationSettings) -> Self {
        Self { resolver, settings }
    }

    /// Validate a compact JWT.
    ///
    /// # Checks, in order
    ///
    /// 1. Size and structure; header must carry `alg` and a non-empty `kid`
    /// 2. Header `alg` is on the allow-list (exact, case-sensitive)
    /// 3. Resolve the key by kid
    /// 4. Key family and declared `alg` match the header
    /// 5. Signature, then `exp`/`nbf`/`iss`/`aud`
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> ValidationOutcome {
        match self.check(token).await {
            Ok(claims) => {
                tracing::debug!(target: "gate.auth.jwt", "Token validated successfully");
                ValidationOutcome::Valid(claims)
            }
            Err(Rejection::Invalid(reason)) => {
                tracing::debug!(target: "gate.auth.jwt", reason = reason.as_str(), "Token rejected");
                ValidationOutcome::Invalid(reason)
            }
            Err(Rejection::Transient(e)) => {
                tracing::debug!(target: "gate.auth.jwt", error = %e, "Token validity undetermined");
                ValidationOutcome::TransientError(e)
            }
        }
    }

    async fn check(&self, token: &str) -> Result<Claims, Rejection> {
        // 1. Size check and header decode (common::jwt)
        let header = decode_header(token).map_err(InvalidReason::from)?;

        // 2. Allow-list, before any key lookup
        let alg = Algorithm::from_str(&header.alg)
            .ok()
            .filter(|alg| {
                is_supported_algorithm(*alg) && self.settings.allowed_algorithms.contains(alg)
            })
            .ok_or(InvalidReason::UnsupportedAlgorithm)?;

        // 3. Key lookup
        let key = self
            .resolver
            .resolve(&header.kid)
            .await
            .map_err(|e| match e {
                KeyResolveError::KeyNotFound(_) => Rejection::Invalid(InvalidReason::UnknownKey),
                KeyResolveError::Fetch(fetch) => Rejection::Transient(fetch),
            })?;

        // 4. Key/algorithm binding
        if !key.accepts(alg, &header.alg) {
            return Err(InvalidReason::KeyMismatch.into());
        }

        // 5. Signature and claims
        let validation = self.validation_for(alg);
        let token_data = decode::<Claims>(token, key.decoding_key(), &validation).map_err(|e| {
            tracing::debug!(target: "gate.auth.jwt", error = %e, "Token verification failed");
            InvalidReason::from(e.kind())
        })?;

        // The library skips iss/aud checks when the claim is absent
        let claims = token_data.claims;
        if let Some(expected) = &self.settings.expected_issuer {
            if claims.iss.as_ref() != Some(expected) {
                return Err(InvalidReason::IssuerMismatch.into());
            }
        }
        if !self.settings.expected_audiences.is_empty() {
            let matched = claims.aud.as_ref().is_some_and(|aud| {
                self.settings
                    .expected_audiences
                    .iter()
                    .any(|expected| aud.contains(expected))
            });
            if !matched {
                return Err(InvalidReason::AudienceMismatch.into());
            }
        }

        Ok(claims)
    }

    fn validation_for(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.leeway = self.settings.clock_skew.as_secs();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp"]);

        if let Some(issuer) = &self.settings.expected_issuer {
            validation.set_issuer(&[issuer]);
        }

        if self.settings.expected_audiences.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&self.settings.expected_audiences);
        }

        validation
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::keys::{SigningKey, StaticKeyResolver};
    use async_trait::async_trait;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use gate_test_utils::{jwks_json, tamper_signature, TestKeypair, TestTokenBuilder};
    use jsonwebtoken::Header;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn resolver_for(keypairs: &[&TestKeypair]) -> Arc<dyn KeyResolver> {
        let body = jwks_json(keypairs).to_string();
        Arc::new(StaticKeyResolver::from_jwks_json(body.as_bytes()).unwrap())
    }

    fn validator(keypairs: &[&TestKeypair], settings: ValidationSettings) -> TokenValidator {
        TokenValidator::new(resolver_for(keypairs), settings)
    }

    /// Resolver that always fails to fetch and counts calls.
    struct UnreachableResolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl KeyResolver for UnreachableResolver {
        async fn resolve(&self, _kid: &str) -> Result<Arc<SigningKey>, KeyResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(KeyFetchError::Request("connection refused".to_string()).into())
        }
    }

    fn unsigned_token(header: &str, claims: &str) -> String {
        format!(
            "{}.{}.c2ln",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims)
        )
    }

    #[tokio::test]
    async fn test_valid_eddsa_token() {
        let keypair = TestKeypair::ed25519(1, "ed-1");
        let token = TestTokenBuilder::new().for_user("alice").sign_with(&keypair);

        let outcome = validator(&[&keypair], ValidationSettings::default())
            .validate(&token)
            .await;

        assert!(
            matches!(&outcome, ValidationOutcome::Valid(claims) if claims.sub.as_deref() == Some("alice")),
            "expected Valid, got {outcome:?}"
        );
    }

    #[tokio::test]
    async fn test_valid_rs256_token() {
        let keypair = TestKeypair::rsa("rsa-1");
        let token = TestTokenBuilder::new().sign_with(&keypair);

        let outcome = validator(&[&keypair], ValidationSettings::default())
            .validate(&token)
            .await;

        assert!(matches!(outcome, ValidationOutcome::Valid(_)));
    }

    #[tokio::test]
    async fn test_tampered_signature_is_bad_signature() {
        let keypair = TestKeypair::ed25519(1, "ed-1");
        let token = tamper_signature(&TestTokenBuilder::new().sign_with(&keypair));

        let outcome = validator(&[&keypair], ValidationSettings::default())
            .validate(&token)
            .await;

        assert_eq!(outcome, ValidationOutcome::Invalid(InvalidReason::BadSignature));
    }

    #[tokio::test]
    async fn test_token_signed_by_other_key_with_same_kid() {
        let published = TestKeypair::ed25519(1, "shared-kid");
        let attacker = TestKeypair::ed25519(2, "shared-kid");
        let token = TestTokenBuilder::new().sign_with(&attacker);

        let outcome = validator(&[&published], ValidationSettings::default())
            .validate(&token)
            .await;

        assert_eq!(outcome, ValidationOutcome::Invalid(InvalidReason::BadSignature));
    }

    #[tokio::test]
    async fn test_expired_by_one_second_with_zero_skew() {
        let keypair = TestKeypair::ed25519(1, "ed-1");
        let token = TestTokenBuilder::new().expires_in(-1).sign_with(&keypair);

        let outcome = validator(&[&keypair], ValidationSettings::default())
            .validate(&token)
            .await;

        assert_eq!(outcome, ValidationOutcome::Invalid(InvalidReason::Expired));
    }

    #[tokio::test]
    async fn test_clock_skew_tolerates_recent_expiry() {
        let keypair = TestKeypair::ed25519(1, "ed-1");
        let token = TestTokenBuilder::new().expires_in(-30).sign_with(&keypair);
        let settings = ValidationSettings {
            clock_skew: Duration::from_secs(60),
            ..ValidationSettings::default()
        };

        let outcome = validator(&[&keypair], settings).validate(&token).await;

        assert!(matches!(outcome, ValidationOutcome::Valid(_)));
    }

    #[tokio::test]
    async fn test_missing_exp_is_invalid_claims() {
        let keypair = TestKeypair::ed25519(1, "ed-1");
        let token = TestTokenBuilder::new().without("exp").sign_with(&keypair);

        let outcome = validator(&[&keypair], ValidationSettings::default())
            .validate(&token)
            .await;

        assert_eq!(outcome, ValidationOutcome::Invalid(InvalidReason::InvalidClaims));
    }

    #[tokio::test]
    async fn test_future_nbf_is_not_yet_valid() {
        let keypair = TestKeypair::ed25519(1, "ed-1");
        let token = TestTokenBuilder::new().not_before_in(120).sign_with(&keypair);

        let outcome = validator(&[&keypair], ValidationSettings::default())
            .validate(&token)
            .await;

        assert_eq!(outcome, ValidationOutcome::Invalid(InvalidReason::NotYetValid));
    }

    #[tokio::test]
    async fn test_issuer_checked_only_when_configured() {
        let keypair = TestKeypair::ed25519(1, "ed-1");
        let token = TestTokenBuilder::new()
            .issued_by("https://sso.example.com/realms/other")
            .sign_with(&keypair);

        let permissive = validator(&[&keypair], ValidationSettings::default());
        assert!(matches!(
            permissive.validate(&token).await,
            ValidationOutcome::Valid(_)
        ));

        let strict = validator(
            &[&keypair],
            ValidationSettings {
                expected_issuer: Some("https://sso.example.com/realms/acme".to_string()),
                ..ValidationSettings::default()
            },
        );
        assert_eq!(
            strict.validate(&token).await,
            ValidationOutcome::Invalid(InvalidReason::IssuerMismatch)
        );
    }

    #[tokio::test]
    async fn test_missing_issuer_rejected_when_configured() {
        let keypair = TestKeypair::ed25519(1, "ed-1");
        let token = TestTokenBuilder::new().sign_with(&keypair);
        let strict = validator(
            &[&keypair],
            ValidationSettings {
                expected_issuer: Some("https://sso.example.com/realms/acme".to_string()),
                ..ValidationSettings::default()
            },
        );

        assert_eq!(
            strict.validate(&token).await,
            ValidationOutcome::Invalid(InvalidReason::IssuerMismatch)
        );
    }

    #[tokio::test]
    async fn test_audience_any_of_configured_set() {
        let keypair = TestKeypair::ed25519(1, "ed-1");
        let settings = ValidationSettings {
            expected_audiences: vec!["orders-api".to_string(), "billing-api".to_string()],
            ..ValidationSettings::default()
        };
        let validator = validator(&[&keypair], settings);

        let single = TestTokenBuilder::new()
            .for_audience("billing-api")
            .sign_with(&keypair);
        assert!(matches!(
            validator.validate(&single).await,
            ValidationOutcome::Valid(_)
        ));

        let array = TestTokenBuilder::new()
            .for_audiences(&["account", "orders-api"])
            .sign_with(&keypair);
        assert!(matches!(
            validator.validate(&array).await,
            ValidationOutcome::Valid(_)
        ));

        let wrong = TestTokenBuilder::new()
            .for_audience("account")
            .sign_with(&keypair);
        assert_eq!(
            validator.validate(&wrong).await,
            ValidationOutcome::Invalid(InvalidReason::AudienceMismatch)
        );
    }

    #[tokio::test]
    async fn test_token_audience_ignored_when_not_configured() {
        let keypair = TestKeypair::ed25519(1, "ed-1");
        let token = TestTokenBuilder::new()
            .for_audience("account")
            .sign_with(&keypair);

        let outcome = validator(&[&keypair], ValidationSettings::default())
            .validate(&token)
            .await;

        assert!(matches!(outcome, ValidationOutcome::Valid(_)));
    }

    #[tokio::test]
    async fn test_unknown_kid_is_invalid_not_transient() {
        let published = TestKeypair::ed25519(1, "published");
        let other = TestKeypair::ed25519(2, "unpublished");
        let token = TestTokenBuilder::new().sign_with(&other);

        let outcome = validator(&[&published], ValidationSettings::default())
            .validate(&token)
            .await;

        assert_eq!(outcome, ValidationOutcome::Invalid(InvalidReason::UnknownKey));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_transient() {
        let keypair = TestKeypair::ed25519(1, "ed-1");
        let token = TestTokenBuilder::new().sign_with(&keypair);
        let resolver = Arc::new(UnreachableResolver {
            calls: AtomicUsize::new(0),
        });
        let validator = TokenValidator::new(resolver.clone(), ValidationSettings::default());

        let outcome = validator.validate(&token).await;

        assert_eq!(
            outcome,
            ValidationOutcome::TransientError(KeyFetchError::Request(
                "connection refused".to_string()
            ))
        );
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_tokens_never_reach_resolver() {
        let resolver = Arc::new(UnreachableResolver {
            calls: AtomicUsize::new(0),
        });
        let validator = TokenValidator::new(resolver.clone(), ValidationSettings::default());

        let cases = [
            ("", InvalidReason::Malformed),
            ("abc", InvalidReason::Malformed),
            ("a.b", InvalidReason::Malformed),
            ("a.b.c.d", InvalidReason::Malformed),
            ("!!!.b.c", InvalidReason::Malformed),
        ];
        for (token, reason) in cases {
            assert_eq!(
                validator.validate(token).await,
                ValidationOutcome::Invalid(reason),
                "token {token:?}"
            );
        }

        let oversized = format!("{}.b.c", "a".repeat(9000));
        assert_eq!(
            validator.validate(&oversized).await,
            ValidationOutcome::Invalid(InvalidReason::TooLarge)
        );

        let no_kid = unsigned_token(r#"{"alg":"EdDSA","typ":"JWT"}"#, r#"{"exp":1}"#);
        assert_eq!(
            validator.validate(&no_kid).await,
            ValidationOutcome::Invalid(InvalidReason::MissingKid)
        );

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disallowed_algorithms_rejected_before_key_lookup() {
        let resolver = Arc::new(UnreachableResolver {
            calls: AtomicUsize::new(0),
        });
        let validator = TokenValidator::new(resolver.clone(), ValidationSettings::default());

        for alg in ["none", "HS256", "HS512", "rs256", "eddsa", "RS1", ""] {
            let token = unsigned_token(
                &format!(r#"{{"alg":"{alg}","kid":"k"}}"#),
                r#"{"exp":9999999999}"#,
            );
            assert_eq!(
                validator.validate(&token).await,
                ValidationOutcome::Invalid(InvalidReason::UnsupportedAlgorithm),
                "alg {alg:?}"
            );
        }

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_hmac_in_allow_list_is_still_rejected() {
        let resolver = Arc::new(UnreachableResolver {
            calls: AtomicUsize::new(0),
        });
        let settings = ValidationSettings {
            allowed_algorithms: vec![Algorithm::HS256, Algorithm::EdDSA],
            ..ValidationSettings::default()
        };
        let validator = TokenValidator::new(resolver.clone(), settings);

        let token = unsigned_token(r#"{"alg":"HS256","kid":"k"}"#, r#"{"exp":9999999999}"#);
        assert_eq!(
            validator.validate(&token).await,
            ValidationOutcome::Invalid(InvalidReason::UnsupportedAlgorithm)
        );
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_algorithm_outside_configured_allow_list() {
        let keypair = TestKeypair::rsa("rsa-1");
        let token = TestTokenBuilder::new().sign_with(&keypair);
        let settings = ValidationSettings {
            allowed_algorithms: vec![Algorithm::EdDSA],
            ..ValidationSettings::default()
        };

        let outcome = validator(&[&keypair], settings).validate(&token).await;

        assert_eq!(
            outcome,
            ValidationOutcome::Invalid(InvalidReason::UnsupportedAlgorithm)
        );
    }

    #[tokio::test]
    async fn test_header_alg_must_match_key_family() {
        // kid names an RSA key, header claims EdDSA, signed by an Ed25519 key
        let rsa = TestKeypair::rsa("victim");
        let ed = TestKeypair::ed25519(1, "attacker");
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = Some("victim".to_string());
        let token = ed.sign_with_header(&header, &TestTokenBuilder::new().build());

        let outcome = validator(&[&rsa], ValidationSettings::default())
            .validate(&token)
            .await;

        assert_eq!(outcome, ValidationOutcome::Invalid(InvalidReason::KeyMismatch));
    }

    #[tokio::test]
    async fn test_header_alg_must_equal_declared_jwk_alg() {
        // JWK pins RS256; a PS256 token under the same kid is refused
        let published = TestKeypair::rsa("rsa-1");
        let signer = TestKeypair::rsa_with_algorithm("rsa-1", Algorithm::PS256);
        let token = TestTokenBuilder::new().sign_with(&signer);

        let outcome = validator(&[&published], ValidationSettings::default())
            .validate(&token)
            .await;

        assert_eq!(outcome, ValidationOutcome::Invalid(InvalidReason::KeyMismatch));
    }

    #[tokio::test]
    async fn test_jwk_without_alg_accepts_family_algorithms() {
        let signer = TestKeypair::rsa_with_algorithm("rsa-1", Algorithm::PS256);
        let body = serde_json::json!({ "keys": [signer.jwk_json_without_alg()] }).to_string();
        let resolver = Arc::new(StaticKeyResolver::from_jwks_json(body.as_bytes()).unwrap());
        let validator = TokenValidator::new(resolver, ValidationSettings::default());

        let token = TestTokenBuilder::new().sign_with(&signer);

        assert!(matches!(
            validator.validate(&token).await,
            ValidationOutcome::Valid(_)
        ));
    }

    #[tokio::test]
    async fn test_validation_is_idempotent() {
        let keypair = TestKeypair::ed25519(1, "ed-1");
        let validator = validator(&[&keypair], ValidationSettings::default());
        let good = TestTokenBuilder::new().sign_with(&keypair);
        let bad = tamper_signature(&good);

        assert_eq!(validator.validate(&good).await, validator.validate(&good).await);
        assert_eq!(validator.validate(&bad).await, validator.validate(&bad).await);
    }

    #[test]
    fn test_invalid_reason_labels_are_unique() {
        let reasons = [
            InvalidReason::TooLarge,
            InvalidReason::Malformed,
            InvalidReason::MissingKid,
            InvalidReason::UnsupportedAlgorithm,
            InvalidReason::UnknownKey,
            InvalidReason::KeyMismatch,
            InvalidReason::BadSignature,
            InvalidReason::Expired,
            InvalidReason::NotYetValid,
            InvalidReason::IssuerMismatch,
            InvalidReason::AudienceMismatch,
            InvalidReason::InvalidClaims,
        ];
        let labels: std::collections::HashSet<&str> =
            reasons.iter().map(|r| r.as_str()).collect();
        assert_eq!(labels.len(), reasons.len());
    }

    #[test]
    fn test_default_settings() {
        let settings = ValidationSettings::default();
        assert_eq!(settings.clock_skew, Duration::ZERO);
        assert!(settings.expected_issuer.is_none());
        assert!(settings.expected_audiences.is_empty());
        assert_eq!(settings.allowed_algorithms, SUPPORTED_ALGORITHMS.to_vec());
        assert!(!is_supported_algorithm(Algorithm::HS256));
    }
}
