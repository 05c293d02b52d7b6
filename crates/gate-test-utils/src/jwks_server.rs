//! Mock key-set endpoint
//!
//! Wraps a `wiremock::MockServer` that answers on the Keycloak certs path
//! for realm [`TEST_REALM`].

use crate::crypto_fixtures::{jwks_json, TestKeypair};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Realm the mock serves.
pub const TEST_REALM: &str = "test";

/// Path of the certs endpoint for [`TEST_REALM`].
pub const TEST_CERTS_PATH: &str = "/realms/test/protocol/openid-connect/certs";

/// Mock authority publishing a JWKS document.
///
/// Expectations set with `expected_fetches` are verified when the server is
/// dropped.
pub struct MockJwksServer {
    server: MockServer,
}

impl MockJwksServer {
    /// Start a server with nothing mounted (every request gets 404).
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Start a server publishing `keypairs`.
    pub async fn with_keys(keypairs: &[&TestKeypair]) -> Self {
        let server = Self::start().await;
        server.serve_keys(keypairs, None).await;
        server
    }

    /// Publish `keypairs`, optionally asserting the exact number of fetches.
    pub async fn serve_keys(&self, keypairs: &[&TestKeypair], expected_fetches: Option<u64>) {
        self.mount(
            ResponseTemplate::new(200).set_body_json(jwks_json(keypairs)),
            expected_fetches,
        )
        .await;
    }

    /// Publish `keypairs` after `delay`.
    pub async fn serve_keys_slowly(
        &self,
        keypairs: &[&TestKeypair],
        delay: Duration,
        expected_fetches: Option<u64>,
    ) {
        self.mount(
            ResponseTemplate::new(200)
                .set_body_json(jwks_json(keypairs))
                .set_delay(delay),
            expected_fetches,
        )
        .await;
    }

    /// Answer every fetch with `status` and an empty body.
    pub async fn serve_status(&self, status: u16, expected_fetches: Option<u64>) {
        self.mount(ResponseTemplate::new(status), expected_fetches)
            .await;
    }

    /// Answer every fetch with `status` after `delay`.
    pub async fn serve_status_slowly(&self, status: u16, delay: Duration, expected_fetches: Option<u64>) {
        self.mount(
            ResponseTemplate::new(status).set_delay(delay),
            expected_fetches,
        )
        .await;
    }

    /// Answer every fetch with 200 and a raw body.
    pub async fn serve_body(&self, body: &str) {
        self.mount(ResponseTemplate::new(200).set_body_string(body), None)
            .await;
    }

    /// Remove everything mounted so far.
    pub async fn reset(&self) {
        self.server.reset().await;
    }

    /// Base URL, usable as `KEYCLOAK_URL`.
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Full certs URL, usable as `JWKS_URL`.
    pub fn jwks_url(&self) -> String {
        format!("{}{TEST_CERTS_PATH}", self.server.uri())
    }

    /// Number of requests received on the certs path.
    pub async fn fetch_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == TEST_CERTS_PATH)
            .count()
    }

    async fn mount(&self, response: ResponseTemplate, expected_fetches: Option<u64>) {
        let mock = Mock::given(method("GET"))
            .and(path(TEST_CERTS_PATH))
            .respond_with(response);
        let mock = match expected_fetches {
            Some(n) => mock.expect(n),
            None => mock,
        };
        mock.mount(&self.server).await;
    }
}
