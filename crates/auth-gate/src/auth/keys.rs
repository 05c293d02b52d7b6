//! Verification keys and the key-resolution capability.
//!
//! A [`KeySet`] is built wholesale from a JWKS document (RFC 7517) and never
//! mutated afterwards; refreshing means building a new one and swapping the
//! `Arc`. Verification code only ever borrows keys through `Arc<SigningKey>`.
//!
//! [`KeyResolver`] is the seam between token validation and key sourcing.
//! The network-backed implementation lives in [`crate::auth::jwks`];
//! [`StaticKeyResolver`] serves a fixed set with no I/O.

use crate::errors::{KeyFetchError, KeyResolveError};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// JSON Web Key as published by the authority.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA", "EC" or "OKP").
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    #[serde(default)]
    pub kid: Option<String>,

    /// Algorithm the key is bound to, if the authority declares one.
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use ("sig" or "enc").
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url).
    #[serde(default)]
    pub e: Option<String>,

    /// Curve name for EC and OKP keys.
    #[serde(default)]
    pub crv: Option<String>,

    /// EC x coordinate, or the OKP public key (base64url).
    #[serde(default)]
    pub x: Option<String>,

    /// EC y coordinate (base64url).
    #[serde(default)]
    pub y: Option<String>,
}

/// JWKS document. Entries stay untyped so one odd key cannot poison the set.
#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<serde_json::Value>,
}

/// Reasons a single JWK cannot be used for signature verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JwkError {
    #[error("JWK has no kid")]
    MissingKid,

    #[error("JWK use '{0}' is not 'sig'")]
    NotForSignature(String),

    #[error("Unsupported JWK key type or curve: {0}")]
    Unsupported(String),

    #[error("JWK is missing parameter '{0}'")]
    MissingParameter(&'static str),

    #[error("Invalid JWK key material: {0}")]
    InvalidMaterial(String),
}

/// Algorithm family of a verification key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Rsa,
    Ec,
    Okp,
}

impl KeyFamily {
    /// Whether a key of this family can verify `alg`.
    pub fn supports(self, alg: Algorithm) -> bool {
        match self {
            KeyFamily::Rsa => matches!(
                alg,
                Algorithm::RS256
                    | Algorithm::RS384
                    | Algorithm::RS512
                    | Algorithm::PS256
                    | Algorithm::PS384
                    | Algorithm::PS512
            ),
            KeyFamily::Ec => matches!(alg, Algorithm::ES256 | Algorithm::ES384),
            KeyFamily::Okp => matches!(alg, Algorithm::EdDSA),
        }
    }
}

/// A single public verification key.
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    family: KeyFamily,
    declared_alg: Option<String>,
    decoding_key: DecodingKey,
}

/// Key material is omitted from Debug output.
impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("family", &self.family)
            .field("declared_alg", &self.declared_alg)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Build a verification key from a published JWK.
    ///
    /// # Errors
    ///
    /// Returns `JwkError` if the JWK has no kid, is an encryption key, has an
    /// unsupported type/curve, or carries undecodable material.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, JwkError> {
        let kid = jwk
            .kid
            .as_ref()
            .filter(|kid| !kid.is_empty())
            .ok_or(JwkError::MissingKid)?
            .clone();

        if let Some(key_use) = &jwk.key_use {
            if key_use != "sig" {
                return Err(JwkError::NotForSignature(key_use.clone()));
            }
        }

        let (family, decoding_key) = match jwk.kty.as_str() {
            "RSA" => {
                let n = jwk.n.as_deref().ok_or(JwkError::MissingParameter("n"))?;
                let e = jwk.e.as_deref().ok_or(JwkError::MissingParameter("e"))?;
                let key = DecodingKey::from_rsa_components(n, e)
                    .map_err(|e| JwkError::InvalidMaterial(e.to_string()))?;
                (KeyFamily::Rsa, key)
            }
            "EC" => {
                match jwk.crv.as_deref() {
                    Some("P-256" | "P-384") => {}
                    other => {
                        return Err(JwkError::Unsupported(format!(
                            "EC/{}",
                            other.unwrap_or("?")
                        )))
                    }
                }
                let x = jwk.x.as_deref().ok_or(JwkError::MissingParameter("x"))?;
                let y = jwk.y.as_deref().ok_or(JwkError::MissingParameter("y"))?;
                let key = DecodingKey::from_ec_components(x, y)
                    .map_err(|e| JwkError::InvalidMaterial(e.to_string()))?;
                (KeyFamily::Ec, key)
            }
            "OKP" => {
                if jwk.crv.as_deref() != Some("Ed25519") {
                    return Err(JwkError::Unsupported(format!(
                        "OKP/{}",
                        jwk.crv.as_deref().unwrap_or("?")
                    )));
                }
                let x = jwk.x.as_deref().ok_or(JwkError::MissingParameter("x"))?;
                let key = DecodingKey::from_ed_components(x)
                    .map_err(|e| JwkError::InvalidMaterial(e.to_string()))?;
                (KeyFamily::Okp, key)
            }
            other => return Err(JwkError::Unsupported(other.to_string())),
        };

        Ok(Self {
            kid,
            family,
            declared_alg: jwk.alg.clone(),
            decoding_key,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn family(&self) -> KeyFamily {
        self.family
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Whether this key may verify a token whose header declares `alg`.
    ///
    /// The family must support the algorithm, and if the JWK pins an `alg`,
    /// the header's raw `alg` string must equal it exactly.
    pub fn accepts(&self, alg: Algorithm, header_alg: &str) -> bool {
        if !self.family.supports(alg) {
            return false;
        }
        match &self.declared_alg {
            Some(declared) => declared == header_alg,
            None => true,
        }
    }
}

/// The authority's full set of verification keys, keyed by kid.
#[derive(Debug, Default)]
pub struct KeySet {
    keys: HashMap<String, Arc<SigningKey>>,
}

impl KeySet {
    /// Parse a JWKS document.
    ///
    /// Unusable entries (no kid, encryption keys, unsupported types, bad
    /// material) are skipped. When a kid repeats, the first entry wins.
    ///
    /// # Errors
    ///
    /// Returns `KeyFetchError::Malformed` if the body is not JSON or has no
    /// `keys` array.
    pub fn from_json(body: &[u8]) -> Result<Self, KeyFetchError> {
        let document: JwksDocument = serde_json::from_slice(body)
            .map_err(|e| KeyFetchError::Malformed(e.to_string()))?;

        let mut keys = HashMap::with_capacity(document.keys.len());
        for entry in document.keys {
            let jwk: Jwk = match serde_json::from_value(entry) {
                Ok(jwk) => jwk,
                Err(e) => {
                    tracing::debug!(target: "gate.auth.keys", error = %e, "Skipping undecodable JWK");
                    continue;
                }
            };
            match SigningKey::from_jwk(&jwk) {
                Ok(key) => {
                    keys.entry(key.kid.clone()).or_insert_with(|| Arc::new(key));
                }
                Err(e) => {
                    tracing::debug!(
                        target: "gate.auth.keys",
                        kid = ?jwk.kid,
                        error = %e,
                        "Skipping unusable JWK"
                    );
                }
            }
        }

        Ok(Self { keys })
    }

    /// Build a set from already-constructed keys. First kid wins.
    pub fn from_keys(keys: impl IntoIterator<Item = SigningKey>) -> Self {
        let mut map = HashMap::new();
        for key in keys {
            map.entry(key.kid.clone()).or_insert_with(|| Arc::new(key));
        }
        Self { keys: map }
    }

    pub fn get(&self, kid: &str) -> Option<Arc<SigningKey>> {
        self.keys.get(kid).cloned()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Resolves a key identifier to a verification key, possibly failing.
///
/// `KeyNotFound` means the authority answered and does not publish the kid;
/// `Fetch` means the authority could not be asked.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    async fn resolve(&self, kid: &str) -> Result<Arc<SigningKey>, KeyResolveError>;
}

/// Resolver over a fixed key set. Never performs I/O.
#[derive(Debug, Clone)]
pub struct StaticKeyResolver {
    key_set: Arc<KeySet>,
}

impl StaticKeyResolver {
    pub fn new(key_set: KeySet) -> Self {
        Self {
            key_set: Arc::new(key_set),
        }
    }

    /// Build from a JWKS document body.
    ///
    /// # Errors
    ///
    /// Returns `KeyFetchError::Malformed` if the document cannot be parsed.
    pub fn from_jwks_json(body: &[u8]) -> Result<Self, KeyFetchError> {
        KeySet::from_json(body).map(Self::new)
    }
}

#[async_trait]
impl KeyResolver for StaticKeyResolver {
    async fn resolve(&self, kid: &str) -> Result<Arc<SigningKey>, KeyResolveError> {
        self.key_set
            .get(kid)
            .ok_or_else(|| KeyResolveError::KeyNotFound(kid.to_string()))
    }
}
