use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use xp_ledger::ledger::ManualClock;
use xp_ledger::store::{LedgerStore, MemoryStore};
use xp_ledger::{create_router, AppState, Config};

/// 2024-01-01T12:00:00Z
pub const NOON_JAN_1: u64 = 1_704_110_400_000;
pub const DAY_MS: u64 = 86_400_000;

/// In-process ledger service on a manual clock.
pub struct TestApp {
    pub state: Arc<AppState>,
    pub clock: Arc<ManualClock>,
    router: Router,
}

/// Decoded response.
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: Value,
    pub text: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(config: Config, store: Arc<dyn LedgerStore>) -> Self {
        let clock = Arc::new(ManualClock::new(NOON_JAN_1));
        let state = Arc::new(AppState::with_store(config, store, clock.clone()));
        Self {
            router: create_router(Arc::clone(&state)),
            state,
            clock,
        }
    }

    pub async fn get(&self, uri: &str) -> Result<Reply> {
        self.send(Method::GET, uri, None, &[]).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Result<Reply> {
        self.send(Method::POST, uri, Some(body.to_string()), &[]).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<String>,
        headers: &[(&str, &str)],
    ) -> Result<Reply> {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        let request = builder.body(body.map(Body::from).unwrap_or_else(Body::empty))?;

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let text = String::from_utf8(bytes.to_vec())?;
        let json = serde_json::from_str(&text).unwrap_or(Value::Null);
        Ok(Reply {
            status,
            headers,
            json,
            text,
        })
    }

    /// `POST /api/xp` for `wallet` and `action`.
    pub async fn award(&self, wallet: &str, action: &str) -> Result<Reply> {
        self.post(
            "/api/xp",
            serde_json::json!({ "wallet": wallet, "action": action }),
        )
        .await
    }

    pub fn advance_past_debounce(&self) {
        self.clock.advance_ms(self.state.config.debounce_ms + 1);
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
