//! Application state shared across handlers.

use crate::config::Config;
use crate::ledger::{Clock, Ledger, LedgerSettings, SystemClock};
use crate::store::{self, LedgerStore};
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub ledger: Ledger,
    pub start_time: Instant,
    pub request_count: AtomicU64,
    /// Set once the store has answered a read.
    pub ready: AtomicBool,
}

impl AppState {
    /// Open the configured store and build the ledger on the system clock.
    pub fn new(config: Config) -> Result<Self, crate::Error> {
        let store = store::open(&config.storage)?;
        info!(
            backend = store.backend(),
            accounts = store.account_count()?,
            sbt_claimed = store.sbt_claimed_total()?,
            "Ledger store opened"
        );
        Ok(Self::with_store(config, store, Arc::new(SystemClock)))
    }

    /// Build state around an existing store and clock.
    pub fn with_store(config: Config, store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        let ledger = Ledger::new(store, clock, LedgerSettings::from(&config));
        Self {
            config,
            ledger,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            ready: AtomicBool::new(false),
        }
    }
}
