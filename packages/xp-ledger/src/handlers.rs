//! HTTP request handlers.

use crate::ledger::{Award, Metadata};
use crate::metrics::METRICS;
use crate::middleware::RequestId;
use crate::response::{
    AwardRequest, AwardResponse, ErrorResponse, HealthResponse, LeaderboardQuery,
    LeaderboardResponse, SbtStatusResponse, WalletQuery, WalletRequest,
};
use crate::state::AppState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{FromRequest, Query, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use xp_types::{normalize_wallet, Action, ValidationError, WalletAddress};

/// Readiness check. Returns 200 once the store has answered a read.
pub async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if !state.ready.load(Ordering::Relaxed) && state.ledger.store().account_count().is_ok() {
        state.ready.store(true, Ordering::Relaxed);
    }

    if state.ready.load(Ordering::Relaxed) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Prometheus metrics in text exposition format.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.ledger.store();
    let body = METRICS.render(
        store.account_count().unwrap_or(0),
        store.sbt_claimed_total().unwrap_or(0),
        state.config.sbt_capacity,
    );
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4",
        )],
        body,
    )
}

/// Health check with store status and SBT totals.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.ledger.store();
    let accounts = store.account_count();
    let sbt_claimed = store.sbt_claimed_total();

    let status = if accounts.is_ok() && sbt_claimed.is_ok() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        store_backend: store.backend(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        requests: state.request_count.load(Ordering::Relaxed),
        accounts: accounts.unwrap_or(0),
        sbt_claimed: sbt_claimed.unwrap_or(0),
        sbt_capacity: state.config.sbt_capacity,
    })
}

/// `GET /api/xp?wallet=`: account view, zero-valued for unknown wallets.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    query: Result<Query<WalletQuery>, QueryRejection>,
) -> Response {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    let wallet = match query_wallet(query) {
        Ok(w) => w,
        Err(resp) => return resp,
    };

    match state.ledger.get_account(&wallet) {
        Ok(view) => Json(view).into_response(),
        Err(e) => storage_failure("", &wallet, e),
    }
}

/// `GET /api/sbt/status?wallet=`: SBT eligibility.
pub async fn sbt_status(
    State(state): State<Arc<AppState>>,
    query: Result<Query<WalletQuery>, QueryRejection>,
) -> Response {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    let wallet = match query_wallet(query) {
        Ok(w) => w,
        Err(resp) => return resp,
    };

    match state.ledger.can_claim_sbt(&wallet) {
        Ok(eligibility) => Json(SbtStatusResponse {
            wallet_address: wallet.to_string(),
            eligibility,
        })
        .into_response(),
        Err(e) => storage_failure("", &wallet, e),
    }
}

/// `GET /api/leaderboard?limit=`: top accounts by XP.
pub async fn leaderboard(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> Response {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => {
            METRICS.validation_errors.fetch_add(1, Ordering::Relaxed);
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.body_text())))
                .into_response();
        }
    };

    match state.ledger.leaderboard(query.limit) {
        Ok(entries) => Json(LeaderboardResponse { entries }).into_response(),
        Err(e) => {
            METRICS.storage_errors.fetch_add(1, Ordering::Relaxed);
            error!(error = %e, "Leaderboard read failed");
            e.into_response()
        }
    }
}

/// `POST /api/xp` `{wallet, action, metadata?}`.
pub async fn award(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let start = Instant::now();
    let req_id = RequestId::of(&request);
    let body: AwardRequest = match parse_body(&state, &req_id, request).await {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    let action = match body.action.as_deref().map(str::trim) {
        None | Some("") => Err("action is required".to_string()),
        Some(a) => a.parse::<Action>().map_err(|e| e.to_string()),
    };

    let resp = process_award(&state, &req_id, body.wallet.as_deref(), action, body.metadata).await;
    METRICS.record_award_duration(start);
    resp
}

/// `POST /api/xp/daily-login` `{wallet}`.
pub async fn daily_login(State(state): State<Arc<AppState>>, request: Request) -> Response {
    fixed_action(state, request, Action::DailyLogin).await
}

/// `POST /api/sbt/claim` `{wallet}`.
pub async fn claim_sbt(State(state): State<Arc<AppState>>, request: Request) -> Response {
    fixed_action(state, request, Action::SbtClaim).await
}

async fn fixed_action(state: Arc<AppState>, request: Request, action: Action) -> Response {
    let start = Instant::now();
    let req_id = RequestId::of(&request);
    let body: WalletRequest = match parse_body(&state, &req_id, request).await {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    let resp = process_award(&state, &req_id, body.wallet.as_deref(), Ok(action), None).await;
    METRICS.record_award_duration(start);
    resp
}

/// Validate input, run the award, and map the outcome to a response.
async fn process_award(
    state: &AppState,
    req_id: &str,
    raw_wallet: Option<&str>,
    action: Result<Action, String>,
    metadata: Option<Metadata>,
) -> Response {
    METRICS.award_requests.fetch_add(1, Ordering::Relaxed);
    state.request_count.fetch_add(1, Ordering::Relaxed);

    let wallet = match normalize_wallet(raw_wallet.unwrap_or_default()) {
        Ok(w) => w,
        Err(e) => return invalid(req_id, e.to_string(), None),
    };

    let action = match action {
        Ok(a) => a,
        Err(msg) => {
            // The wallet is fine, so show the caller where they stand.
            let account = state.ledger.get_account(&wallet).ok();
            return invalid(req_id, msg, account);
        }
    };

    if let Some(meta) = &metadata {
        let size = metadata_size(meta);
        if size > state.config.max_metadata_bytes {
            let account = state.ledger.get_account(&wallet).ok();
            return invalid(
                req_id,
                format!(
                    "metadata exceeds {} bytes",
                    state.config.max_metadata_bytes
                ),
                account,
            );
        }
    }

    info!(req_id = %req_id, wallet = %wallet, action = %action, "Award requested");

    match state.ledger.award_xp(&wallet, action, metadata).await {
        Ok(award) => {
            match &award {
                Award::Granted { xp_earned, .. } => METRICS.record_grant(*xp_earned),
                Award::Rejected { rejection, .. } => METRICS.record_rejection(*rejection),
            }
            let (status, body) = AwardResponse::from_award(award);
            (status, Json(body)).into_response()
        }
        Err(e) => storage_failure(req_id, &wallet, e),
    }
}

/// Parse a JSON body, answering 400 on malformed input.
async fn parse_body<T: DeserializeOwned>(
    state: &Arc<AppState>,
    req_id: &str,
    request: Request,
) -> Result<T, Response> {
    match Json::<T>::from_request(request, state).await {
        Ok(Json(body)) => Ok(body),
        Err(e) => {
            METRICS.award_requests.fetch_add(1, Ordering::Relaxed);
            METRICS.validation_errors.fetch_add(1, Ordering::Relaxed);
            state.request_count.fetch_add(1, Ordering::Relaxed);
            warn!(req_id = %req_id, error = %e, "Invalid JSON body");
            Err((
                StatusCode::BAD_REQUEST,
                Json(AwardResponse::invalid("Invalid JSON body", None)),
            )
                .into_response())
        }
    }
}

/// Serialized JSON length, the unit the metadata cap is stated in.
fn metadata_size(meta: &Metadata) -> usize {
    serde_json::to_vec(meta).map_or(usize::MAX, |b| b.len())
}

fn query_wallet(query: Result<Query<WalletQuery>, QueryRejection>) -> Result<WalletAddress, Response> {
    let raw = match query {
        Ok(Query(q)) => q.wallet,
        Err(e) => {
            METRICS.validation_errors.fetch_add(1, Ordering::Relaxed);
            return Err(
                (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.body_text()))).into_response(),
            );
        }
    };

    normalize_wallet(raw.as_deref().unwrap_or_default()).map_err(|e: ValidationError| {
        METRICS.validation_errors.fetch_add(1, Ordering::Relaxed);
        (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string()))).into_response()
    })
}

fn invalid(
    req_id: &str,
    message: String,
    account: Option<crate::ledger::AccountView>,
) -> Response {
    METRICS.validation_errors.fetch_add(1, Ordering::Relaxed);
    warn!(req_id = %req_id, error = %message, "Rejected malformed award request");
    (
        StatusCode::BAD_REQUEST,
        Json(AwardResponse::invalid(message, account)),
    )
        .into_response()
}

fn storage_failure(req_id: &str, wallet: &WalletAddress, e: crate::Error) -> Response {
    METRICS.storage_errors.fetch_add(1, Ordering::Relaxed);
    error!(req_id = %req_id, wallet = %wallet, error = %e, "Ledger storage failure");
    e.into_response()
}
