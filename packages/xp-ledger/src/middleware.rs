//! API key gate for mutating routes and `x-request-id` correlation.

use crate::response::ErrorResponse;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rand::Rng;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;

const API_KEY_HEADER: &str = "x-api-key";
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Inbound ids longer than this are replaced with a generated one.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Reject award, daily-login, and claim calls that lack the configured key.
/// With no key configured every call passes.
pub async fn api_key_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.api_key.as_deref() else {
        return next.run(request).await;
    };

    if presented_key(request.headers()).is_some_and(|key| key_matches(expected, key)) {
        return next.run(request).await;
    }

    warn!(
        req_id = %RequestId::of(&request),
        path = %request.uri().path(),
        "Rejected ledger write without a valid API key"
    );
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("Unauthorized: invalid or missing API key")),
    )
        .into_response()
}

/// The caller's key: `x-api-key` wins over `Authorization: Bearer`.
fn presented_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(key.trim());
    }
    let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = auth.trim().split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
}

fn key_matches(expected: &str, provided: &str) -> bool {
    // ct_eq on unequal lengths is already false; the length itself is not secret.
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// Attach a [`RequestId`] to the request and echo it on the response.
pub async fn inject_request_id(mut request: Request, next: Next) -> Response {
    let id = RequestId::from_headers(request.headers()).unwrap_or_else(RequestId::generate);
    let echoed = HeaderValue::from_str(&id.0).ok();
    request.extensions_mut().insert(id);

    let mut response = next.run(request).await;
    if let Some(value) = echoed {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Correlation id carried in request extensions and logged by handlers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn generate() -> Self {
        Self(format!("xp-{:016x}", rand::thread_rng().gen::<u64>()))
    }

    /// A caller-supplied id, if it is short printable ASCII.
    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let raw = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?;
        let valid = !raw.is_empty()
            && raw.len() <= MAX_REQUEST_ID_LEN
            && raw.bytes().all(|b| b.is_ascii_graphic());
        valid.then(|| Self(raw.to_string()))
    }

    /// The id attached by [`inject_request_id`], or empty outside that layer.
    pub fn of(request: &Request) -> String {
        request
            .extensions()
            .get::<RequestId>()
            .map(|r| r.0.clone())
            .unwrap_or_default()
    }
}
