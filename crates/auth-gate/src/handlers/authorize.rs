//! External-authorization handler.
//!
//! Fronting proxies (nginx `auth_request`, Envoy `ext_authz`) forward the
//! original request headers here and act on the status code.

use crate::decision::{AuthRequest, AuthorizationDecision};
use crate::routes::AppState;
use axum::extract::State;
use axum::http::header::{CONTENT_TYPE, WWW_AUTHENTICATE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

/// Handler for ANY /authorize
///
/// Replies with the decision's status and fixed `text/plain` body. 401
/// replies also carry `WWW-Authenticate: Bearer`.
#[instrument(skip_all, name = "gate.authorize")]
pub async fn authorize(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let request = auth_request_from_headers(&headers);
    let decision = state.engine.decide(&request).await;
    decision_response(&decision)
}

/// Collect headers into an [`AuthRequest`].
///
/// Values that are not visible ASCII are dropped. Repeated headers keep their
/// first non-empty value.
pub fn auth_request_from_headers(headers: &HeaderMap) -> AuthRequest {
    let mut collected: HashMap<String, String> = HashMap::new();

    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        collected
            .entry(name.as_str().to_string())
            .or_insert_with(|| value.to_string());
    }

    AuthRequest::new(collected)
}

fn decision_response(decision: &AuthorizationDecision) -> Response {
    let status =
        StatusCode::from_u16(decision.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut response = (status, decision.body()).into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    if status == StatusCode::UNAUTHORIZED {
        response_headers.insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::decision::UnauthorizedReason;
    use crate::errors::KeyFetchError;
    use axum::http::HeaderName;

    #[test]
    fn test_headers_are_collected() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc"));
        headers.insert("x-request-id", HeaderValue::from_static("r-1"));

        let request = auth_request_from_headers(&headers);

        assert_eq!(request.authorization(), Some("Bearer abc"));
        assert_eq!(request.headers.get("x-request-id").map(String::as_str), Some("r-1"));
    }

    #[test]
    fn test_repeated_header_keeps_first_non_empty_value() {
        let mut headers = HeaderMap::new();
        let name = HeaderName::from_static("authorization");
        headers.append(name.clone(), HeaderValue::from_static(""));
        headers.append(name.clone(), HeaderValue::from_static("Bearer first"));
        headers.append(name, HeaderValue::from_static("Bearer second"));

        let request = auth_request_from_headers(&headers);

        assert_eq!(request.authorization(), Some("Bearer first"));
    }

    #[test]
    fn test_non_ascii_value_is_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap(),
        );

        let request = auth_request_from_headers(&headers);

        assert_eq!(request.authorization(), None);
    }

    #[test]
    fn test_unauthorized_response_carries_challenge() {
        let response = decision_response(&AuthorizationDecision::Unauthorized(
            UnauthorizedReason::MissingHeader,
        ));

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get(WWW_AUTHENTICATE).unwrap(), "Bearer");
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_other_responses_have_no_challenge() {
        for decision in [
            AuthorizationDecision::Authorized,
            AuthorizationDecision::ServerError(KeyFetchError::Status(503)),
        ] {
            let response = decision_response(&decision);
            assert_eq!(response.status().as_u16(), decision.status_code());
            assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
        }
    }
}
