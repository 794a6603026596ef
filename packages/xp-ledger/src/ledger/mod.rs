//! XP ledger: balances, transaction history, and reward gating per wallet.
//!
//! Each award runs read → check → commit inside the wallet's critical
//! section. Commits are compare-and-swap against the store, so a second
//! writer (another instance sharing the store) forces a re-read instead of a
//! lost update.

mod account;
mod clock;
mod locks;
mod rules;

pub use account::{AccountRecord, AccountView, Metadata, Transaction};
pub use clock::{utc_date, Clock, ManualClock, SystemClock};
pub use locks::WalletLocks;
pub use rules::Rejection;

use crate::config::Config;
use crate::store::{Commit, CommitOutcome, LedgerStore, SbtClaimRequest};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use xp_types::{Action, WalletAddress};

/// Re-read and re-evaluate this many times on version conflicts.
const MAX_COMMIT_ATTEMPTS: usize = 3;

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
pub const MAX_LEADERBOARD_LIMIT: usize = 100;

/// Ledger rule parameters.
#[derive(Debug, Clone, Copy)]
pub struct LedgerSettings {
    pub debounce_ms: u64,
    pub history_limit: usize,
    pub sbt_capacity: u64,
}

impl From<&Config> for LedgerSettings {
    fn from(c: &Config) -> Self {
        Self {
            debounce_ms: c.debounce_ms,
            history_limit: c.history_limit,
            sbt_capacity: c.sbt_capacity,
        }
    }
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Outcome of [`Ledger::award_xp`]. Both arms carry the current account.
#[derive(Debug, Clone, PartialEq)]
pub enum Award {
    Granted {
        xp_earned: u64,
        /// Registry sequence number, for `SBT_CLAIM` only.
        claim_number: Option<u64>,
        account: AccountView,
    },
    Rejected {
        rejection: Rejection,
        account: AccountView,
    },
}

impl Award {
    pub fn is_granted(&self) -> bool {
        matches!(self, Award::Granted { .. })
    }

    pub fn account(&self) -> &AccountView {
        match self {
            Award::Granted { account, .. } | Award::Rejected { account, .. } => account,
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Award::Granted { .. } => None,
            Award::Rejected { rejection, .. } => Some(*rejection),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SbtEligibility {
    pub can_claim: bool,
    pub already_claimed: bool,
    pub limit_reached: bool,
    pub remaining: u64,
    pub total_claimed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub wallet_address: WalletAddress,
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    pub level: u64,
}

/// Monotonic transaction ids: `max(now_ms << 12, last + 1)` as 16 hex digits.
/// Lexicographic order equals creation order.
#[derive(Debug, Default)]
pub struct TxIdGenerator {
    last: AtomicU64,
}

impl TxIdGenerator {
    pub fn next(&self, now_ms: u64) -> String {
        let floor = now_ms << 12;
        let mut cur = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = floor.max(cur + 1);
            match self
                .last
                .compare_exchange_weak(cur, candidate, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return format!("{candidate:016x}"),
                Err(actual) => cur = actual,
            }
        }
    }
}

/// The ledger. Sole writer of accounts and the SBT registry.
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    locks: WalletLocks,
    ids: TxIdGenerator,
    settings: LedgerSettings,
}

impl Ledger {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>, settings: LedgerSettings) -> Self {
        Self {
            store,
            clock,
            locks: WalletLocks::new(),
            ids: TxIdGenerator::default(),
            settings,
        }
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Current account, or the zero-valued view for an unknown wallet.
    /// Read-only: nothing is persisted for unknown wallets.
    pub fn get_account(&self, wallet: &WalletAddress) -> Result<AccountView, crate::Error> {
        Ok(self
            .store
            .load(wallet)?
            .map(|r| r.view())
            .unwrap_or_else(|| AccountView::empty(wallet.clone())))
    }

    /// Grant `action` to `wallet` if the rules allow it.
    ///
    /// Rule rejections come back as [`Award::Rejected`]; only storage
    /// failures are errors.
    pub async fn award_xp(
        &self,
        wallet: &WalletAddress,
        action: Action,
        metadata: Option<Metadata>,
    ) -> Result<Award, crate::Error> {
        let _guard = self.locks.lock(wallet).await;

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let now = self.clock.now_ms();
            let current = self.store.load(wallet)?;
            let expected_version = current.as_ref().map_or(0, |r| r.version);
            let current = current.unwrap_or_else(|| AccountRecord::new(wallet.clone(), now));

            if let Err(rejection) = rules::evaluate(
                &current,
                action,
                metadata.as_ref(),
                now,
                self.settings.debounce_ms,
            ) {
                info!(wallet = %wallet, action = %action, reason = rejection.reason(), "Award rejected");
                return Ok(Award::Rejected {
                    rejection,
                    account: current.view(),
                });
            }

            let tx = Transaction {
                id: self.ids.next(now),
                wallet_address: wallet.clone(),
                action,
                xp_amount: action.xp_amount(),
                timestamp: now,
                metadata: metadata.clone(),
            };
            let mut updated = current.clone();
            rules::apply_grant(&mut updated, tx, self.settings.history_limit);

            let sbt_claim = (action == Action::SbtClaim).then_some(SbtClaimRequest {
                capacity: self.settings.sbt_capacity,
                claimed_at: now,
            });

            match self.store.commit(Commit {
                record: updated.clone(),
                expected_version,
                sbt_claim,
            })? {
                CommitOutcome::Committed { claim_number } => {
                    updated.version = expected_version + 1;
                    info!(
                        wallet = %wallet,
                        action = %action,
                        xp = action.xp_amount(),
                        total_xp = updated.total_xp,
                        level = updated.level(),
                        claim_number,
                        "XP granted"
                    );
                    return Ok(Award::Granted {
                        xp_earned: action.xp_amount(),
                        claim_number,
                        account: updated.view(),
                    });
                }
                CommitOutcome::CapacityExhausted => {
                    warn!(wallet = %wallet, capacity = self.settings.sbt_capacity, "SBT claim limit reached");
                    return Ok(Award::Rejected {
                        rejection: Rejection::LimitReached,
                        account: current.view(),
                    });
                }
                CommitOutcome::AlreadyRegistered { claim_number } => {
                    warn!(wallet = %wallet, claim_number, "SBT registry entry without account flag");
                    return Ok(Award::Rejected {
                        rejection: Rejection::AlreadyClaimed,
                        account: current.view(),
                    });
                }
                CommitOutcome::Conflict => {
                    debug!(wallet = %wallet, attempt, "Version conflict, re-reading account");
                }
            }
        }

        Err(crate::Error::Storage(format!(
            "commit contention for {wallet} after {MAX_COMMIT_ATTEMPTS} attempts"
        )))
    }

    /// Convenience entry point for `DAILY_LOGIN`.
    pub async fn daily_login(&self, wallet: &WalletAddress) -> Result<Award, crate::Error> {
        self.award_xp(wallet, Action::DailyLogin, None).await
    }

    /// Convenience entry point for `SBT_CLAIM`. Capacity is enforced inside
    /// the same commit that sets the account flag.
    pub async fn claim_sbt(&self, wallet: &WalletAddress) -> Result<Award, crate::Error> {
        self.award_xp(wallet, Action::SbtClaim, None).await
    }

    /// Whether `wallet` could claim the SBT right now. Read-only.
    pub fn can_claim_sbt(&self, wallet: &WalletAddress) -> Result<SbtEligibility, crate::Error> {
        let total_claimed = self.store.sbt_claimed_total()?;
        let flagged = self
            .store
            .load(wallet)?
            .is_some_and(|r| r.sbt_claimed);
        let registered = self.store.sbt_claim_number(wallet)?.is_some();

        let already_claimed = flagged || registered;
        let limit_reached = total_claimed >= self.settings.sbt_capacity;
        Ok(SbtEligibility {
            can_claim: !already_claimed && !limit_reached,
            already_claimed,
            limit_reached,
            remaining: self.settings.sbt_capacity.saturating_sub(total_claimed),
            total_claimed,
        })
    }

    /// Top accounts by XP. `limit` is clamped to `1..=MAX_LEADERBOARD_LIMIT`.
    pub fn leaderboard(&self, limit: Option<usize>) -> Result<Vec<LeaderboardEntry>, crate::Error> {
        let limit = limit
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
            .clamp(1, MAX_LEADERBOARD_LIMIT);
        Ok(self
            .store
            .top_accounts(limit)?
            .into_iter()
            .enumerate()
            .map(|(i, r)| LeaderboardEntry {
                rank: i + 1,
                level: r.level(),
                total_xp: r.total_xp,
                wallet_address: r.wallet_address,
            })
            .collect())
    }
}
