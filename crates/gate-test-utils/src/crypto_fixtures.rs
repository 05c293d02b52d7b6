//! Deterministic cryptographic fixtures for testing
//!
//! Provides reproducible signing keys and the matching public JWKs.
//! Ed25519 keys are derived from a seed value; the RSA key is a fixed PEM
//! fixture checked into `fixtures/`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ring::signature::{Ed25519KeyPair, KeyPair};
use serde::Serialize;
use thiserror::Error;

/// 2048-bit RSA private key (PKCS#1 PEM) used for RS256 fixtures.
pub const TEST_RSA_PRIVATE_KEY_PEM: &str = include_str!("../fixtures/rsa_test_key.pem");

/// Modulus of [`TEST_RSA_PRIVATE_KEY_PEM`] (base64url, no padding).
pub const TEST_RSA_MODULUS: &str = "tgnq__4N8dZpSMOGb8CgoXIfbnStHjOZ6BCnhUIk8JGGPXpT4zhKzL4DmQPwghoRAnSrC1xI2IXx5gungjZPEY7DhGuA9ghHVDQK1LdY8mfJ9OwBKpikIoiIkwtZItBv3prbf7G4UZ9aDooJsEy4R9FmN9EiCC_JaINiqaXoFHTs6MxWEFYS8otHDM59QHie8fkirf3f2TtBj7uOB9stbiiDRj2htK3ACxi40HabgYruqDavY7gwTjVi3dD8JkQHOfl7-38aOZPvXmHocnd6LfA2KFPcjs1EXlN8uhKEq-wH4FJcO09iLcma0Rhit0-Ku-hF5r5cY2YrDaOPyYufTw";

/// Public exponent of [`TEST_RSA_PRIVATE_KEY_PEM`].
pub const TEST_RSA_EXPONENT: &str = "AQAB";

/// Test fixture error type
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),
}

/// A signing keypair with a kid, able to mint tokens and publish its JWK.
pub struct TestKeypair {
    kid: String,
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    jwk: serde_json::Value,
}

impl TestKeypair {
    /// Deterministic Ed25519 keypair. The same seed always produces the same key.
    pub fn ed25519(seed: u8, kid: &str) -> Self {
        Self::try_ed25519(seed, kid).expect("Failed to create Ed25519 test keypair")
    }

    /// Fallible form of [`TestKeypair::ed25519`].
    pub fn try_ed25519(seed: u8, kid: &str) -> Result<Self, FixtureError> {
        let seed_bytes = seed_bytes(seed);

        let key_pair = Ed25519KeyPair::from_seed_unchecked(&seed_bytes)
            .map_err(|e| FixtureError::Crypto(format!("Failed to generate test keypair: {e:?}")))?;

        let jwk = serde_json::json!({
            "kty": "OKP",
            "kid": kid,
            "crv": "Ed25519",
            "x": URL_SAFE_NO_PAD.encode(key_pair.public_key().as_ref()),
            "alg": "EdDSA",
            "use": "sig"
        });

        Ok(Self {
            kid: kid.to_string(),
            algorithm: Algorithm::EdDSA,
            encoding_key: EncodingKey::from_ed_der(&build_pkcs8_from_seed(&seed_bytes)),
            jwk,
        })
    }

    /// RS256 keypair backed by the PEM fixture.
    pub fn rsa(kid: &str) -> Self {
        Self::rsa_with_algorithm(kid, Algorithm::RS256)
    }

    /// RSA keypair signing with `algorithm` (RS* or PS*). The JWK declares it.
    pub fn rsa_with_algorithm(kid: &str, algorithm: Algorithm) -> Self {
        let encoding_key = EncodingKey::from_rsa_pem(TEST_RSA_PRIVATE_KEY_PEM.as_bytes())
            .expect("RSA fixture PEM should parse");

        let jwk = serde_json::json!({
            "kty": "RSA",
            "kid": kid,
            "n": TEST_RSA_MODULUS,
            "e": TEST_RSA_EXPONENT,
            "alg": format!("{algorithm:?}"),
            "use": "sig"
        });

        Self {
            kid: kid.to_string(),
            algorithm,
            encoding_key,
            jwk,
        }
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Public JWK as the authority would publish it.
    pub fn jwk_json(&self) -> serde_json::Value {
        self.jwk.clone()
    }

    /// Public JWK with the `alg` member removed.
    pub fn jwk_json_without_alg(&self) -> serde_json::Value {
        let mut jwk = self.jwk.clone();
        if let Some(object) = jwk.as_object_mut() {
            object.remove("alg");
        }
        jwk
    }

    /// Sign `claims` with a standard header (`typ: JWT`, this key's kid and alg).
    pub fn sign<T: Serialize>(&self, claims: &T) -> String {
        let mut header = Header::new(self.algorithm);
        header.typ = Some("JWT".to_string());
        header.kid = Some(self.kid.clone());
        self.sign_with_header(&header, claims)
    }

    /// Sign `claims` with a caller-supplied header.
    ///
    /// `header.alg` must belong to this key's family.
    pub fn sign_with_header<T: Serialize>(&self, header: &Header, claims: &T) -> String {
        encode(header, claims, &self.encoding_key).expect("Failed to sign test token")
    }
}

/// JWKS document containing the public keys of `keypairs`, in order.
pub fn jwks_json(keypairs: &[&TestKeypair]) -> serde_json::Value {
    let keys: Vec<serde_json::Value> = keypairs.iter().map(|k| k.jwk_json()).collect();
    serde_json::json!({ "keys": keys })
}

/// Alter the last character of the token's signature.
///
/// The replacement keeps the token well-formed base64url so the failure is
/// a signature mismatch, not a decoding error.
pub fn tamper_signature(token: &str) -> String {
    let mut chars: Vec<char> = token.chars().collect();
    let last = chars.pop().expect("token should not be empty");
    chars.push(if last == 'A' { 'Q' } else { 'A' });
    chars.into_iter().collect()
}

/// Create deterministic 32-byte seed from input
fn seed_bytes(seed: u8) -> [u8; 32] {
    let mut seed_bytes = [0u8; 32];
    seed_bytes[0] = seed;
    // Fill rest with deterministic pattern
    for (i, byte) in seed_bytes.iter_mut().enumerate().skip(1) {
        *byte = seed.wrapping_mul(i as u8).wrapping_add(i as u8);
    }
    seed_bytes
}

/// Build PKCS#8 v1 document from Ed25519 seed
///
/// This is a test-only utility. Ring doesn't expose the PKCS#8 form of a
/// seeded keypair, so we build it.
fn build_pkcs8_from_seed(seed: &[u8; 32]) -> Vec<u8> {
    let mut pkcs8 = Vec::with_capacity(48);

    // Outer SEQUENCE, 46 bytes
    pkcs8.extend_from_slice(&[0x30, 0x2e]);
    // Version: INTEGER 0
    pkcs8.extend_from_slice(&[0x02, 0x01, 0x00]);
    // AlgorithmIdentifier: SEQUENCE { OID 1.3.101.112 }
    pkcs8.extend_from_slice(&[0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70]);
    // privateKey: OCTET STRING wrapping OCTET STRING(32) with the seed
    pkcs8.extend_from_slice(&[0x04, 0x22, 0x04, 0x20]);
    pkcs8.extend_from_slice(seed);

    pkcs8
}
