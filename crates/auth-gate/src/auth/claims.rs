//! JWT claims structure.
//!
//! Contains the registered claims the gate inspects. Only `exp` is required;
//! every other claim is optional. The `sub` field is redacted in Debug output
//! to prevent exposure in logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The `aud` claim, which RFC 7519 allows as a string or an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    /// Whether `value` is one of the audiences.
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == value,
            Audience::Many(auds) => auds.iter().any(|aud| aud == value),
        }
    }
}

/// Claims of a validated token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - redacted in Debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not-before timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Authorized party (the OAuth client the token was issued to).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,

    /// Token type, e.g. "Bearer" for Keycloak access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

/// Custom Debug implementation that redacts the `sub` field.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &self.sub.as_ref().map(|_| "[REDACTED]"))
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("nbf", &self.nbf)
            .field("azp", &self.azp)
            .field("typ", &self.typ)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_debug_redacts_sub() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "sub": "f3b1c2d4-user-id",
            "exp": 1_900_000_000,
        }))
        .unwrap();

        let debug_str = format!("{claims:?}");

        assert!(
            !debug_str.contains("f3b1c2d4-user-id"),
            "Debug output should not contain actual sub value"
        );
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_claims_keycloak_access_token_shape() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "exp": 1_900_000_300,
            "iat": 1_900_000_000,
            "jti": "onrtac:5d1c",
            "iss": "https://sso.example.com/realms/acme",
            "aud": "account",
            "sub": "user-1",
            "typ": "Bearer",
            "azp": "web-app",
            "realm_access": {"roles": ["offline_access"]},
            "scope": "openid profile email"
        }))
        .unwrap();

        assert_eq!(claims.exp, 1_900_000_300);
        assert_eq!(claims.iat, Some(1_900_000_000));
        assert_eq!(claims.iss.as_deref(), Some("https://sso.example.com/realms/acme"));
        assert_eq!(claims.aud, Some(Audience::Single("account".to_string())));
        assert_eq!(claims.azp.as_deref(), Some("web-app"));
        assert_eq!(claims.typ.as_deref(), Some("Bearer"));
    }

    #[test]
    fn test_claims_audience_array() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "exp": 1,
            "aud": ["orders-api", "account"]
        }))
        .unwrap();

        let aud = claims.aud.unwrap();
        assert!(aud.contains("orders-api"));
        assert!(aud.contains("account"));
        assert!(!aud.contains("Account"));
    }

    #[test]
    fn test_claims_require_exp() {
        let result = serde_json::from_value::<Claims>(serde_json::json!({"sub": "user"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_claims_serialization_omits_absent_fields() {
        let claims: Claims = serde_json::from_value(serde_json::json!({"exp": 42})).unwrap();

        let json = serde_json::to_string(&claims).unwrap();
        assert_eq!(json, r#"{"exp":42}"#);
    }
}
