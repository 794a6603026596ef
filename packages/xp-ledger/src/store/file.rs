//! JSON snapshot persistence for crash recovery.

use super::memory::Tables;
use super::{Commit, CommitOutcome, LedgerStore, SbtClaimEntry, StoreError};
use crate::ledger::AccountRecord;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};
use xp_types::WalletAddress;

const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// In-memory tables mirrored to a snapshot file.
///
/// Write-through mode persists inside the commit and rolls the commit back if
/// the write fails. Every commit then rewrites the whole snapshot on the
/// calling thread while holding the table write lock, so cost grows with the
/// ledger size. Otherwise commits mark the store dirty and
/// [`LedgerStore::flush`] writes the snapshot.
pub struct FileStore {
    path: PathBuf,
    tables: RwLock<Tables>,
    write_through: bool,
    dirty: AtomicBool,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRef<'a> {
    version: u32,
    accounts: Vec<&'a AccountRecord>,
    sbt_claims: &'a [SbtClaimEntry],
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    version: u32,
    #[serde(default)]
    accounts: Vec<AccountRecord>,
    #[serde(default)]
    sbt_claims: Vec<SbtClaimEntry>,
}

impl FileStore {
    /// Open the snapshot at `path`, starting empty when it does not exist.
    pub fn open(path: impl Into<PathBuf>, write_through: bool) -> Result<Self, StoreError> {
        let path = path.into();
        let tables = load_snapshot(&path)?;
        Ok(Self {
            path,
            tables: RwLock::new(tables),
            write_through,
            dirty: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl LedgerStore for FileStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    fn load(&self, wallet: &WalletAddress) -> Result<Option<AccountRecord>, StoreError> {
        Ok(self.read().accounts.get(wallet).cloned())
    }

    fn commit(&self, commit: Commit) -> Result<CommitOutcome, StoreError> {
        let mut tables = self.write();
        let (outcome, undo) = tables.apply(commit);
        let Some(undo) = undo else {
            return Ok(outcome);
        };

        if self.write_through {
            if let Err(e) = save_snapshot(&self.path, &tables) {
                tables.undo(undo);
                return Err(e);
            }
        } else {
            self.dirty.store(true, Ordering::Release);
        }
        Ok(outcome)
    }

    fn sbt_claimed_total(&self) -> Result<u64, StoreError> {
        Ok(self.read().sbt_claims.len() as u64)
    }

    fn sbt_claim_number(&self, wallet: &WalletAddress) -> Result<Option<u64>, StoreError> {
        Ok(self.read().sbt_claim_number(wallet))
    }

    fn top_accounts(&self, limit: usize) -> Result<Vec<AccountRecord>, StoreError> {
        Ok(self.read().top_accounts(limit))
    }

    fn account_count(&self) -> Result<usize, StoreError> {
        Ok(self.read().accounts.len())
    }

    fn flush(&self) -> Result<(), StoreError> {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        // Read lock blocks commits, so the snapshot is a consistent cut.
        let tables = self.read();
        if let Err(e) = save_snapshot(&self.path, &tables) {
            self.dirty.store(true, Ordering::Release);
            return Err(e);
        }
        Ok(())
    }
}

fn load_snapshot(path: &Path) -> Result<Tables, StoreError> {
    if !path.exists() {
        info!(path = %path.display(), "No ledger snapshot found, starting fresh");
        return Ok(Tables::default());
    }

    let data = std::fs::read(path)
        .map_err(|e| StoreError::Io(format!("Failed to read snapshot: {e}")))?;

    let snapshot: Snapshot = serde_json::from_slice(&data)
        .map_err(|e| StoreError::Corrupt(format!("Failed to parse snapshot: {e}")))?;

    if snapshot.version != SNAPSHOT_FORMAT_VERSION {
        return Err(StoreError::Corrupt(format!(
            "Unsupported snapshot version {} (expected {SNAPSHOT_FORMAT_VERSION})",
            snapshot.version
        )));
    }

    let orphaned = flagged_without_entry(&snapshot.accounts, &snapshot.sbt_claims);
    if orphaned > 0 {
        warn!(
            count = orphaned,
            "Snapshot has SBT-flagged accounts missing from the claim registry"
        );
    }

    info!(
        path = %path.display(),
        accounts = snapshot.accounts.len(),
        sbt_claims = snapshot.sbt_claims.len(),
        "Ledger snapshot loaded"
    );

    Ok(Tables::from_parts(snapshot.accounts, snapshot.sbt_claims))
}

/// Accounts flagged as SBT holders that have no registry entry.
fn flagged_without_entry(accounts: &[AccountRecord], claims: &[SbtClaimEntry]) -> usize {
    let registered: HashSet<&WalletAddress> = claims.iter().map(|c| &c.wallet_address).collect();
    accounts
        .iter()
        .filter(|a| a.sbt_claimed && !registered.contains(&a.wallet_address))
        .count()
}

fn save_snapshot(path: &Path, tables: &Tables) -> Result<(), StoreError> {
    let mut accounts: Vec<&AccountRecord> = tables.accounts.values().collect();
    accounts.sort_by(|a, b| a.wallet_address.cmp(&b.wallet_address));

    let snapshot = SnapshotRef {
        version: SNAPSHOT_FORMAT_VERSION,
        accounts,
        sbt_claims: &tables.sbt_claims,
    };

    let json = serde_json::to_vec_pretty(&snapshot)
        .map_err(|e| StoreError::Corrupt(format!("Failed to serialize snapshot: {e}")))?;

    // Atomic write: tmp + rename
    let tmp = path.with_extension("tmp");
    if let Some(parent) = tmp.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Io(format!("Failed to create snapshot directory: {e}"))
            })?;
        }
    }
    std::fs::write(&tmp, &json)
        .map_err(|e| StoreError::Io(format!("Failed to write snapshot: {e}")))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| StoreError::Io(format!("Failed to rename snapshot: {e}")))?;

    info!(path = %path.display(), accounts = tables.accounts.len(), "Ledger snapshot saved");
    Ok(())
}
