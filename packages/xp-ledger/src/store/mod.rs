//! Storage abstraction for ledger accounts and the SBT claim registry.
//!
//! The ledger never touches maps or files directly; it reads a versioned
//! [`AccountRecord`], decides, and hands the result back as a [`Commit`].
//! A commit is compare-and-swap on the record version, and when it carries an
//! SBT claim it also takes a registry slot in the same atomic step.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::config::{StorageBackend, StorageConfig};
use crate::ledger::AccountRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use xp_types::WalletAddress;

/// Backing-store failure. The only ledger error class worth retrying.
#[derive(Debug, Clone)]
pub enum StoreError {
    Io(String),
    Corrupt(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(msg) => write!(f, "io: {msg}"),
            StoreError::Corrupt(msg) => write!(f, "corrupt store: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Ask the store to register the wallet in the SBT registry with this commit.
#[derive(Debug, Clone, Copy)]
pub struct SbtClaimRequest {
    pub capacity: u64,
    /// Epoch ms recorded on the registry entry.
    pub claimed_at: u64,
}

/// One atomic account write.
#[derive(Debug, Clone)]
pub struct Commit {
    pub record: AccountRecord,
    /// Version the caller read; 0 when the account did not exist yet.
    pub expected_version: u64,
    pub sbt_claim: Option<SbtClaimRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Written with version `expected_version + 1`.
    Committed { claim_number: Option<u64> },
    /// Someone else wrote the record since it was read. Nothing was written.
    Conflict,
    /// The SBT registry is full. Nothing was written.
    CapacityExhausted,
    /// The wallet already holds a registry entry. Nothing was written.
    AlreadyRegistered { claim_number: u64 },
}

/// Registry entry; `claim_number` is 1-based and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SbtClaimEntry {
    pub wallet_address: WalletAddress,
    pub claim_number: u64,
    #[serde(default)]
    pub claimed_at: u64,
}

pub trait LedgerStore: Send + Sync {
    /// Short backend name for diagnostics.
    fn backend(&self) -> &'static str;

    fn load(&self, wallet: &WalletAddress) -> Result<Option<AccountRecord>, StoreError>;

    fn commit(&self, commit: Commit) -> Result<CommitOutcome, StoreError>;

    /// Number of wallets in the SBT registry.
    fn sbt_claimed_total(&self) -> Result<u64, StoreError>;

    /// The wallet's registry entry number, if it has claimed.
    fn sbt_claim_number(&self, wallet: &WalletAddress) -> Result<Option<u64>, StoreError>;

    /// Accounts ordered by XP descending, then wallet ascending.
    fn top_accounts(&self, limit: usize) -> Result<Vec<AccountRecord>, StoreError>;

    fn account_count(&self) -> Result<usize, StoreError>;

    /// Persist buffered writes. No-op for volatile backends.
    fn flush(&self) -> Result<(), StoreError>;
}

/// Open the backend selected by configuration.
pub fn open(config: &StorageConfig) -> Result<Arc<dyn LedgerStore>, StoreError> {
    match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory ledger store (state is lost on restart)");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::File => {
            let store = FileStore::open(&config.path, config.flush_interval_secs == 0)?;
            Ok(Arc::new(store))
        }
    }
}

/// Periodically flush the store. Returns when `cancel` is triggered.
pub async fn run_flusher(
    store: Arc<dyn LedgerStore>,
    interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {},
            _ = cancel.cancelled() => {
                info!("Snapshot flusher shutting down");
                return;
            }
        }

        // Serialization and file I/O are blocking; keep them off the runtime.
        let target = Arc::clone(&store);
        match tokio::task::spawn_blocking(move || target.flush()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "Snapshot flush failed"),
            Err(e) => error!(error = %e, "Snapshot flush task failed"),
        }
    }
}
