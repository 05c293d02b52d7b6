//! Gate configuration.
//!
//! Configuration is loaded from environment variables once at startup. Any
//! error is fatal: the process must not start with a partial configuration.
//! Variables set to an empty string are treated as unset.

use crate::auth::jwks::{JwksOptions, DEFAULT_FETCH_TIMEOUT};
use crate::auth::jwt::{is_supported_algorithm, ValidationSettings, SUPPORTED_ALGORITHMS};
use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use jsonwebtoken::Algorithm;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Upper bound for `JWKS_FETCH_TIMEOUT_SECONDS`.
pub const MAX_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 60;

/// Gate configuration.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Authority's JWKS endpoint. Derived from `KEYCLOAK_URL` and
    /// `KEYCLOAK_REALM` unless `JWKS_URL` overrides it.
    pub jwks_url: String,

    /// Leeway for `exp`/`nbf` checks (default: 0).
    pub jwt_clock_skew: Duration,

    /// Required `iss` claim, if any.
    pub expected_issuer: Option<String>,

    /// Accepted `aud` values; empty disables the check.
    pub expected_audiences: Vec<String>,

    /// Header algorithms accepted.
    pub allowed_algorithms: Vec<Algorithm>,

    /// Bound on one JWKS fetch (default: 10s).
    pub jwks_fetch_timeout: Duration,

    /// Key set lifetime; `None` keeps it for the process lifetime.
    pub jwks_cache_ttl: Option<Duration>,

    /// Window after a fetch in which unknown kids do not trigger a refetch.
    pub jwks_min_refresh_interval: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("jwks_url", &self.jwks_url)
            .field("jwt_clock_skew", &self.jwt_clock_skew)
            .field("expected_issuer", &self.expected_issuer)
            .field("expected_audiences", &self.expected_audiences)
            .field("allowed_algorithms", &self.allowed_algorithms)
            .field("jwks_fetch_timeout", &self.jwks_fetch_timeout)
            .field("jwks_cache_ttl", &self.jwks_cache_ttl)
            .field("jwks_min_refresh_interval", &self.jwks_min_refresh_interval)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid JWT algorithm configuration: {0}")]
    InvalidAlgorithms(String),

    #[error("Invalid JWKS fetch timeout configuration: {0}")]
    InvalidJwksFetchTimeout(String),

    #[error("Invalid JWKS cache TTL configuration: {0}")]
    InvalidJwksCacheTtl(String),

    #[error("Invalid JWKS minimum refresh interval configuration: {0}")]
    InvalidJwksMinRefreshInterval(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let jwks_url = match get(vars, "JWKS_URL") {
            Some(url) => url.to_string(),
            None => {
                let base = get(vars, "KEYCLOAK_URL")
                    .ok_or_else(|| ConfigError::MissingEnvVar("KEYCLOAK_URL".to_string()))?;
                let realm = get(vars, "KEYCLOAK_REALM")
                    .ok_or_else(|| ConfigError::MissingEnvVar("KEYCLOAK_REALM".to_string()))?;
                keycloak_jwks_url(base, realm)
            }
        };

        let bind_address = get(vars, "BIND_ADDRESS")
            .unwrap_or(DEFAULT_BIND_ADDRESS)
            .to_string();

        // Parse JWT clock skew tolerance with validation
        let jwt_clock_skew = match get(vars, "JWT_CLOCK_SKEW_SECONDS") {
            Some(value_str) => {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidJwtClockSkew(format!(
                        "JWT_CLOCK_SKEW_SECONDS must be a non-negative integer, got '{value_str}': {e}"
                    ))
                })?;

                if value > MAX_CLOCK_SKEW.as_secs() {
                    return Err(ConfigError::InvalidJwtClockSkew(format!(
                        "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {value}",
                        MAX_CLOCK_SKEW.as_secs()
                    )));
                }

                Duration::from_secs(value)
            }
            None => DEFAULT_CLOCK_SKEW,
        };

        let expected_issuer = get(vars, "JWT_EXPECTED_ISSUER").map(ToString::to_string);

        let expected_audiences: Vec<String> = get(vars, "JWT_EXPECTED_AUDIENCE")
            .map(|value| split_list(value).map(ToString::to_string).collect())
            .unwrap_or_default();

        let allowed_algorithms = match get(vars, "JWT_ALLOWED_ALGORITHMS") {
            Some(value) => parse_algorithms(value)?,
            None => SUPPORTED_ALGORITHMS.to_vec(),
        };

        // Parse JWKS fetch timeout with validation
        let jwks_fetch_timeout = match get(vars, "JWKS_FETCH_TIMEOUT_SECONDS") {
            Some(value_str) => {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidJwksFetchTimeout(format!(
                        "JWKS_FETCH_TIMEOUT_SECONDS must be a valid positive integer, got '{value_str}': {e}"
                    ))
                })?;

                if value == 0 || value > MAX_JWKS_FETCH_TIMEOUT_SECONDS {
                    return Err(ConfigError::InvalidJwksFetchTimeout(format!(
                        "JWKS_FETCH_TIMEOUT_SECONDS must be between 1 and {MAX_JWKS_FETCH_TIMEOUT_SECONDS}, got {value}"
                    )));
                }

                Duration::from_secs(value)
            }
            None => DEFAULT_FETCH_TIMEOUT,
        };

        let jwks_cache_ttl = match get(vars, "JWKS_CACHE_TTL_SECONDS") {
            Some(value_str) => {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidJwksCacheTtl(format!(
                        "JWKS_CACHE_TTL_SECONDS must be a valid positive integer, got '{value_str}': {e}"
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidJwksCacheTtl(
                        "JWKS_CACHE_TTL_SECONDS must be greater than 0".to_string(),
                    ));
                }

                Some(Duration::from_secs(value))
            }
            None => None,
        };

        let jwks_min_refresh_interval = match get(vars, "JWKS_MIN_REFRESH_INTERVAL_SECONDS") {
            Some(value_str) => {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidJwksMinRefreshInterval(format!(
                        "JWKS_MIN_REFRESH_INTERVAL_SECONDS must be a non-negative integer, got '{value_str}': {e}"
                    ))
                })?;
                Duration::from_secs(value)
            }
            None => Duration::ZERO,
        };

        Ok(Config {
            bind_address,
            jwks_url,
            jwt_clock_skew,
            expected_issuer,
            expected_audiences,
            allowed_algorithms,
            jwks_fetch_timeout,
            jwks_cache_ttl,
            jwks_min_refresh_interval,
        })
    }

    /// Token validation settings derived from this configuration.
    pub fn validation_settings(&self) -> ValidationSettings {
        ValidationSettings {
            clock_skew: self.jwt_clock_skew,
            expected_issuer: self.expected_issuer.clone(),
            expected_audiences: self.expected_audiences.clone(),
            allowed_algorithms: self.allowed_algorithms.clone(),
        }
    }

    /// JWKS client options derived from this configuration.
    pub fn jwks_options(&self) -> JwksOptions {
        JwksOptions {
            fetch_timeout: self.jwks_fetch_timeout,
            cache_ttl: self.jwks_cache_ttl,
            min_refresh_interval: self.jwks_min_refresh_interval,
        }
    }
}

/// Keycloak's certs endpoint for `realm`.
pub fn keycloak_jwks_url(base_url: &str, realm: &str) -> String {
    format!(
        "{}/realms/{realm}/protocol/openid-connect/certs",
        base_url.trim_end_matches('/')
    )
}

fn get<'a>(vars: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    vars.get(name)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn parse_algorithms(value: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let mut algorithms = Vec::new();
    for name in split_list(value) {
        let alg = Algorithm::from_str(name).map_err(|_| {
            ConfigError::InvalidAlgorithms(format!(
                "JWT_ALLOWED_ALGORITHMS contains unknown or unsigned algorithm '{name}'"
            ))
        })?;

        if !is_supported_algorithm(alg) {
            return Err(ConfigError::InvalidAlgorithms(format!(
                "JWT_ALLOWED_ALGORITHMS must list asymmetric algorithms only, got '{name}'"
            )));
        }

        if !algorithms.contains(&alg) {
            algorithms.push(alg);
        }
    }

    if algorithms.is_empty() {
        return Err(ConfigError::InvalidAlgorithms(
            "JWT_ALLOWED_ALGORITHMS must list at least one algorithm".to_string(),
        ));
    }

    Ok(algorithms)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            (
                "KEYCLOAK_URL".to_string(),
                "https://sso.example.com".to_string(),
            ),
            ("KEYCLOAK_REALM".to_string(), "acme".to_string()),
        ])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        assert_eq!(
            config.jwks_url,
            "https://sso.example.com/realms/acme/protocol/openid-connect/certs"
        );
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.jwt_clock_skew, Duration::ZERO);
        assert_eq!(config.expected_issuer, None);
        assert!(config.expected_audiences.is_empty());
        assert_eq!(config.allowed_algorithms, SUPPORTED_ALGORITHMS.to_vec());
        assert_eq!(config.jwks_fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.jwks_cache_ttl, None);
        assert_eq!(config.jwks_min_refresh_interval, Duration::ZERO);
    }

    #[test]
    fn test_from_vars_trims_trailing_slash_from_keycloak_url() {
        let mut vars = base_vars();
        vars.insert(
            "KEYCLOAK_URL".to_string(),
            "https://sso.example.com/".to_string(),
        );

        let config = Config::from_vars(&vars).unwrap();

        assert_eq!(
            config.jwks_url,
            "https://sso.example.com/realms/acme/protocol/openid-connect/certs"
        );
    }

    #[test]
    fn test_from_vars_missing_keycloak_url() {
        let mut vars = base_vars();
        vars.remove("KEYCLOAK_URL");

        let result = Config::from_vars(&vars);

        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref name)) if name == "KEYCLOAK_URL")
        );
    }

    #[test]
    fn test_from_vars_missing_keycloak_realm() {
        let mut vars = base_vars();
        vars.remove("KEYCLOAK_REALM");

        let result = Config::from_vars(&vars);

        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref name)) if name == "KEYCLOAK_REALM")
        );
    }

    #[test]
    fn test_from_vars_empty_value_counts_as_missing() {
        let mut vars = base_vars();
        vars.insert("KEYCLOAK_REALM".to_string(), String::new());

        let result = Config::from_vars(&vars);

        assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn test_from_vars_jwks_url_override() {
        let vars = HashMap::from([(
            "JWKS_URL".to_string(),
            "https://issuer.example.com/.well-known/jwks.json".to_string(),
        )]);

        let config = Config::from_vars(&vars).unwrap();

        assert_eq!(
            config.jwks_url,
            "https://issuer.example.com/.well-known/jwks.json"
        );
    }

    #[test]
    fn test_from_vars_custom_values() {
        let mut vars = base_vars();
        vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string());
        vars.insert("JWT_CLOCK_SKEW_SECONDS".to_string(), "30".to_string());
        vars.insert(
            "JWT_EXPECTED_ISSUER".to_string(),
            "https://sso.example.com/realms/acme".to_string(),
        );
        vars.insert(
            "JWT_EXPECTED_AUDIENCE".to_string(),
            "orders-api, billing-api,,".to_string(),
        );
        vars.insert(
            "JWT_ALLOWED_ALGORITHMS".to_string(),
            "RS256,EdDSA,RS256".to_string(),
        );
        vars.insert("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), "3".to_string());
        vars.insert("JWKS_CACHE_TTL_SECONDS".to_string(), "900".to_string());
        vars.insert(
            "JWKS_MIN_REFRESH_INTERVAL_SECONDS".to_string(),
            "15".to_string(),
        );

        let config = Config::from_vars(&vars).unwrap();

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.jwt_clock_skew, Duration::from_secs(30));
        assert_eq!(
            config.expected_issuer.as_deref(),
            Some("https://sso.example.com/realms/acme")
        );
        assert_eq!(config.expected_audiences, vec!["orders-api", "billing-api"]);
        assert_eq!(
            config.allowed_algorithms,
            vec![Algorithm::RS256, Algorithm::EdDSA]
        );
        assert_eq!(config.jwks_fetch_timeout, Duration::from_secs(3));
        assert_eq!(config.jwks_cache_ttl, Some(Duration::from_secs(900)));
        assert_eq!(config.jwks_min_refresh_interval, Duration::from_secs(15));

        let settings = config.validation_settings();
        assert_eq!(settings.clock_skew, Duration::from_secs(30));
        assert_eq!(settings.expected_audiences.len(), 2);

        let options = config.jwks_options();
        assert_eq!(options.fetch_timeout, Duration::from_secs(3));
        assert_eq!(options.cache_ttl, Some(Duration::from_secs(900)));
        assert_eq!(options.min_refresh_interval, Duration::from_secs(15));
    }

    #[test]
    fn test_clock_skew_bounds() {
        for (value, ok) in [("0", true), ("600", true), ("601", false), ("-1", false), ("abc", false)] {
            let mut vars = base_vars();
            vars.insert("JWT_CLOCK_SKEW_SECONDS".to_string(), value.to_string());

            let result = Config::from_vars(&vars);

            if ok {
                assert!(result.is_ok(), "skew {value} should be accepted");
            } else {
                assert!(
                    matches!(result, Err(ConfigError::InvalidJwtClockSkew(_))),
                    "skew {value} should be rejected"
                );
            }
        }
    }

    #[test]
    fn test_fetch_timeout_bounds() {
        for (value, ok) in [("1", true), ("60", true), ("0", false), ("61", false), ("1.5", false)] {
            let mut vars = base_vars();
            vars.insert("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), value.to_string());

            let result = Config::from_vars(&vars);

            if ok {
                assert!(result.is_ok(), "timeout {value} should be accepted");
            } else {
                assert!(
                    matches!(result, Err(ConfigError::InvalidJwksFetchTimeout(_))),
                    "timeout {value} should be rejected"
                );
            }
        }
    }

    #[test]
    fn test_cache_ttl_must_be_positive() {
        let mut vars = base_vars();
        vars.insert("JWKS_CACHE_TTL_SECONDS".to_string(), "0".to_string());

        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidJwksCacheTtl(_))
        ));
    }

    #[test]
    fn test_min_refresh_interval_rejects_garbage() {
        let mut vars = base_vars();
        vars.insert(
            "JWKS_MIN_REFRESH_INTERVAL_SECONDS".to_string(),
            "soon".to_string(),
        );

        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidJwksMinRefreshInterval(_))
        ));
    }

    #[test]
    fn test_allowed_algorithms_reject_symmetric_and_none() {
        for value in ["HS256", "RS256,HS512", "none", "rs256", "RSA-OAEP", " , "] {
            let mut vars = base_vars();
            vars.insert("JWT_ALLOWED_ALGORITHMS".to_string(), value.to_string());

            assert!(
                matches!(
                    Config::from_vars(&vars),
                    Err(ConfigError::InvalidAlgorithms(_))
                ),
                "algorithms {value:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_keycloak_jwks_url() {
        assert_eq!(
            keycloak_jwks_url("http://localhost:8180//", "master"),
            "http://localhost:8180/realms/master/protocol/openid-connect/certs"
        );
    }

    #[test]
    fn test_config_debug_lists_fields() {
        let config = Config::from_vars(&base_vars()).unwrap();
        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("jwks_url"));
        assert!(debug_output.contains("bind_address"));
    }
}
