//! JWKS client for fetching and caching the authority's public keys.
//!
//! The client fetches the key set from the authority's JWKS endpoint (for
//! Keycloak, `{base}/realms/{realm}/protocol/openid-connect/certs`) and keeps
//! it for the life of the process, or for a configurable TTL.
//!
//! # Refresh
//!
//! A lookup miss (unknown kid, nothing cached yet, or TTL expired) is the
//! only refresh trigger. There is no background refresh.
//!
//! Every completed fetch advances a generation counter. A caller that misses
//! records the generation it saw, then waits on the refresh lock. If the
//! generation has moved on by the time it gets the lock, another caller has
//! already fetched on its behalf and it takes that fetch's outcome instead of
//! fetching again. N concurrent misses therefore cost one request to the
//! authority, and all N observe the same result.
//!
//! A failed fetch leaves the previous key set in place.

use crate::auth::keys::{KeyResolver, KeySet, SigningKey};
use crate::errors::{KeyFetchError, KeyResolveError};
use crate::observability::metrics;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

/// Default bound on a single key-set fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Tuning for [`JwksClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwksOptions {
    /// Upper bound on one fetch, connect through body.
    pub fetch_timeout: Duration,

    /// Age after which the cached set is treated as absent. `None` keeps it
    /// for the process lifetime.
    pub cache_ttl: Option<Duration>,

    /// An unknown kid seen within this long of the last successful fetch is
    /// rejected without fetching. Zero disables the check.
    pub min_refresh_interval: Duration,
}

impl Default for JwksOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            cache_ttl: None,
            min_refresh_interval: Duration::ZERO,
        }
    }
}

/// Cache contents, guarded by one lock so readers never see a partial update.
#[derive(Default)]
struct CacheState {
    /// Number of completed fetches, successful or not.
    generation: u64,

    /// Most recent successfully fetched key set.
    key_set: Option<Arc<KeySet>>,

    /// When `key_set` was fetched.
    fetched_at: Option<Instant>,

    /// Outcome of the fetch that produced `generation`.
    last_outcome: Option<Result<Arc<KeySet>, KeyFetchError>>,
}

impl CacheState {
    fn fresh_key_set(&self, ttl: Option<Duration>) -> Option<&Arc<KeySet>> {
        let key_set = self.key_set.as_ref()?;
        match (ttl, self.fetched_at) {
            (Some(ttl), Some(fetched_at)) if fetched_at.elapsed() >= ttl => None,
            _ => Some(key_set),
        }
    }

    fn fetched_within(&self, interval: Duration) -> bool {
        !interval.is_zero()
            && self
                .fetched_at
                .is_some_and(|fetched_at| fetched_at.elapsed() < interval)
    }
}

/// JWKS client for fetching and caching public keys.
///
/// Thread-safe; share it behind an `Arc`.
pub struct JwksClient {
    /// URL to the JWKS endpoint.
    jwks_url: String,

    /// HTTP client for fetching JWKS.
    http_client: reqwest::Client,

    options: JwksOptions,

    cache: RwLock<CacheState>,

    /// Serializes fetches. Held across the network call.
    refresh_lock: Mutex<()>,
}

impl JwksClient {
    /// Create a client with default options.
    pub fn new(jwks_url: String) -> Self {
        Self::with_options(jwks_url, JwksOptions::default())
    }

    /// Create a client with custom options.
    pub fn with_options(jwks_url: String, options: JwksOptions) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(options.fetch_timeout)
            .connect_timeout(options.fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "gate.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            options,
            cache: RwLock::new(CacheState::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    pub fn options(&self) -> &JwksOptions {
        &self.options
    }

    /// Get a verification key by kid, fetching the key set on a miss.
    ///
    /// # Errors
    ///
    /// Returns `KeyResolveError::KeyNotFound` if the kid is absent from the
    /// authority's key set after a fresh fetch (or within the minimum refresh
    /// interval). Returns `KeyResolveError::Fetch` if the key set could not
    /// be fetched.
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn get_key(&self, kid: &str) -> Result<Arc<SigningKey>, KeyResolveError> {
        let observed_generation = {
            let cache = self.cache.read().await;
            if let Some(key_set) = cache.fresh_key_set(self.options.cache_ttl) {
                if let Some(key) = key_set.get(kid) {
                    tracing::debug!(target: "gate.auth.jwks", kid = %kid, "JWKS cache hit");
                    return Ok(key);
                }
                if cache.fetched_within(self.options.min_refresh_interval) {
                    tracing::debug!(
                        target: "gate.auth.jwks",
                        kid = %kid,
                        "Unknown kid within minimum refresh interval, not refetching"
                    );
                    return Err(KeyResolveError::KeyNotFound(kid.to_string()));
                }
            }
            cache.generation
        };

        let key_set = self.refresh(Some(observed_generation)).await?;

        key_set.get(kid).ok_or_else(|| {
            tracing::debug!(target: "gate.auth.jwks", kid = %kid, "Key not found in JWKS after refresh");
            KeyResolveError::KeyNotFound(kid.to_string())
        })
    }

    /// Fetch the key set now, regardless of cache state.
    ///
    /// Returns the number of usable keys in the new set.
    ///
    /// # Errors
    ///
    /// Returns `KeyFetchError` if the fetch fails; the previous set is kept.
    pub async fn force_refresh(&self) -> Result<usize, KeyFetchError> {
        self.refresh(None).await.map(|key_set| key_set.len())
    }

    /// Number of keys in the cached set (zero before the first fetch).
    pub async fn cached_key_count(&self) -> usize {
        self.cache
            .read()
            .await
            .key_set
            .as_ref()
            .map_or(0, |key_set| key_set.len())
    }

    /// Run one fetch, or adopt the outcome of a fetch that completed after
    /// `observed_generation`.
    async fn refresh(
        &self,
        observed_generation: Option<u64>,
    ) -> Result<Arc<KeySet>, KeyFetchError> {
        let _refresh_guard = self.refresh_lock.lock().await;

        if let Some(observed) = observed_generation {
            let cache = self.cache.read().await;
            if cache.generation != observed {
                if let Some(outcome) = &cache.last_outcome {
                    tracing::debug!(
                        target: "gate.auth.jwks",
                        generation = cache.generation,
                        "Sharing result of concurrent JWKS fetch"
                    );
                    return outcome.clone();
                }
            }
        }

        let outcome = self.fetch().await.map(Arc::new);

        let mut cache = self.cache.write().await;
        cache.generation = cache.generation.wrapping_add(1);
        if let Ok(key_set) = &outcome {
            cache.key_set = Some(Arc::clone(key_set));
            cache.fetched_at = Some(Instant::now());
            metrics::set_cached_keys(key_set.len());
        }
        cache.last_outcome = Some(outcome.clone());

        outcome
    }

    /// Fetch and parse the key set, bounded by the fetch timeout.
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<KeySet, KeyFetchError> {
        tracing::debug!(target: "gate.auth.jwks", url = %self.jwks_url, "Fetching JWKS");

        let start = Instant::now();
        let result = tokio::time::timeout(self.options.fetch_timeout, self.fetch_document())
            .await
            .unwrap_or(Err(KeyFetchError::Timeout));
        let duration = start.elapsed();

        match &result {
            Ok(key_set) => {
                metrics::record_jwks_fetch("success", None, duration);
                tracing::debug!(
                    target: "gate.auth.jwks",
                    key_count = key_set.len(),
                    "JWKS cache refreshed"
                );
            }
            Err(e) => {
                metrics::record_jwks_fetch("error", Some(e.kind()), duration);
                tracing::debug!(target: "gate.auth.jwks", error = %e, "JWKS fetch failed");
            }
        }

        result
    }

    async fn fetch_document(&self) -> Result<KeySet, KeyFetchError> {
        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeyFetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(request_error)?;
        KeySet::from_json(&body)
    }
}

fn request_error(e: reqwest::Error) -> KeyFetchError {
    if e.is_timeout() {
        KeyFetchError::Timeout
    } else {
        KeyFetchError::Request(e.to_string())
    }
}

#[async_trait]
impl KeyResolver for JwksClient {
    async fn resolve(&self, kid: &str) -> Result<Arc<SigningKey>, KeyResolveError> {
        self.get_key(kid).await
    }
}
