//! Process-local store. Also the table layer under [`super::FileStore`].

use super::{Commit, CommitOutcome, LedgerStore, SbtClaimEntry, StoreError};
use crate::ledger::AccountRecord;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use xp_types::WalletAddress;

/// Account table plus SBT registry. Always mutated under one write lock.
#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) accounts: HashMap<WalletAddress, AccountRecord>,
    pub(crate) sbt_claims: Vec<SbtClaimEntry>,
    sbt_index: HashMap<WalletAddress, u64>,
}

/// What [`Tables::apply`] changed, so a failed persist can put it back.
pub(crate) struct Undo {
    wallet: WalletAddress,
    previous: Option<AccountRecord>,
    pushed_claim: bool,
}

impl Tables {
    pub(crate) fn from_parts(accounts: Vec<AccountRecord>, sbt_claims: Vec<SbtClaimEntry>) -> Self {
        let sbt_index = sbt_claims
            .iter()
            .map(|c| (c.wallet_address.clone(), c.claim_number))
            .collect();
        let accounts = accounts
            .into_iter()
            .map(|a| (a.wallet_address.clone(), a))
            .collect();
        Self {
            accounts,
            sbt_claims,
            sbt_index,
        }
    }

    fn current_version(&self, wallet: &WalletAddress) -> u64 {
        self.accounts.get(wallet).map_or(0, |a| a.version)
    }

    /// Compare-and-swap the record; take a registry slot when asked.
    pub(crate) fn apply(&mut self, commit: Commit) -> (CommitOutcome, Option<Undo>) {
        let Commit {
            mut record,
            expected_version,
            sbt_claim,
        } = commit;
        let wallet = record.wallet_address.clone();

        if self.current_version(&wallet) != expected_version {
            return (CommitOutcome::Conflict, None);
        }

        let mut claim_number = None;
        let mut pushed_claim = false;
        if let Some(req) = sbt_claim {
            // The registry is authoritative even when the account flag is missing.
            if let Some(&n) = self.sbt_index.get(&wallet) {
                return (CommitOutcome::AlreadyRegistered { claim_number: n }, None);
            }
            let total = self.sbt_claims.len() as u64;
            if total >= req.capacity {
                return (CommitOutcome::CapacityExhausted, None);
            }
            let n = total + 1;
            self.sbt_claims.push(SbtClaimEntry {
                wallet_address: wallet.clone(),
                claim_number: n,
                claimed_at: req.claimed_at,
            });
            self.sbt_index.insert(wallet.clone(), n);
            claim_number = Some(n);
            pushed_claim = true;
        }

        record.version = expected_version + 1;
        let previous = self.accounts.insert(wallet.clone(), record);

        (
            CommitOutcome::Committed { claim_number },
            Some(Undo {
                wallet,
                previous,
                pushed_claim,
            }),
        )
    }

    pub(crate) fn undo(&mut self, undo: Undo) {
        match undo.previous {
            Some(prev) => {
                self.accounts.insert(undo.wallet.clone(), prev);
            }
            None => {
                self.accounts.remove(&undo.wallet);
            }
        }
        if undo.pushed_claim {
            if let Some(entry) = self.sbt_claims.pop() {
                self.sbt_index.remove(&entry.wallet_address);
            }
        }
    }

    pub(crate) fn sbt_claim_number(&self, wallet: &WalletAddress) -> Option<u64> {
        self.sbt_index.get(wallet).copied()
    }

    pub(crate) fn top_accounts(&self, limit: usize) -> Vec<AccountRecord> {
        let mut ranked: Vec<&AccountRecord> = self.accounts.values().collect();
        ranked.sort_by(|a, b| {
            b.total_xp
                .cmp(&a.total_xp)
                .then_with(|| a.wallet_address.cmp(&b.wallet_address))
        });
        ranked.into_iter().take(limit).cloned().collect()
    }
}

/// In-memory store. State lives for the process lifetime.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl LedgerStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn load(&self, wallet: &WalletAddress) -> Result<Option<AccountRecord>, StoreError> {
        Ok(self.read().accounts.get(wallet).cloned())
    }

    fn commit(&self, commit: Commit) -> Result<CommitOutcome, StoreError> {
        Ok(self.write().apply(commit).0)
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
        Ok(())
    }
}
