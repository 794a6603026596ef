//! HTTP router setup.

use crate::handlers;
use crate::middleware::{api_key_auth, inject_request_id};
use crate::state::AppState;
use axum::http::{Method, StatusCode};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Create the application router. Mutating routes sit behind the API key.
pub fn create(state: Arc<AppState>) -> Router {
    let auth = from_fn_with_state(Arc::clone(&state), api_key_auth);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/metrics", get(handlers::metrics))
        .route(
            "/api/xp",
            get(handlers::get_account).merge(post(handlers::award).route_layer(auth.clone())),
        )
        .route(
            "/api/xp/daily-login",
            post(handlers::daily_login).route_layer(auth.clone()),
        )
        .route(
            "/api/sbt/claim",
            post(handlers::claim_sbt).route_layer(auth),
        )
        .route("/api/sbt/status", get(handlers::sbt_status))
        .route("/api/leaderboard", get(handlers::leaderboard))
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(inject_request_id))
                .layer(TraceLayer::new_for_http())
                .layer(timeout_layer(state.config.request_timeout()))
                .layer(cors),
        )
        .with_state(state)
}

/// Requests running past `limit` are answered with 408.
fn timeout_layer(limit: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, limit)
}
