//! Reward-granting rules.
//!
//! Pure functions over an [`AccountRecord`]; the caller holds the wallet's
//! critical section and commits the result.

use super::account::{AccountRecord, Metadata, Transaction};
use super::clock::utc_date;
use std::fmt;
use xp_types::Action;

/// A well-formed request the current state does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Same `(wallet, action)` granted inside the debounce window.
    Duplicate,
    /// `DAILY_LOGIN` already granted for the current UTC date.
    AlreadyClaimedToday,
    /// `SBT_CLAIM` already granted for this wallet.
    AlreadyClaimed,
    /// SBT registry is full.
    LimitReached,
    /// `SWAP` without `metadata.transactionHash`.
    UnverifiedSwap,
}

impl Rejection {
    /// Stable reason string returned to callers.
    pub const fn reason(self) -> &'static str {
        match self {
            Rejection::Duplicate => "duplicate",
            Rejection::AlreadyClaimedToday => "already claimed today",
            Rejection::AlreadyClaimed => "already claimed",
            Rejection::LimitReached => "limit reached",
            Rejection::UnverifiedSwap => "unverified swap",
        }
    }

    pub const fn message(self) -> &'static str {
        match self {
            Rejection::Duplicate => "Duplicate request, please wait a few seconds",
            Rejection::AlreadyClaimedToday => "Daily login XP already claimed today",
            Rejection::AlreadyClaimed => "SBT already claimed",
            Rejection::LimitReached => "SBT claim limit reached",
            Rejection::UnverifiedSwap => "Swap XP requires a submitted transaction hash",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Check whether `action` may be granted now. Debounce first, then the
/// action-specific precondition.
pub fn evaluate(
    record: &AccountRecord,
    action: Action,
    metadata: Option<&Metadata>,
    now_ms: u64,
    debounce_ms: u64,
) -> Result<(), Rejection> {
    if let Some(&last) = record.last_granted.get(&action) {
        // A daily login on a new UTC date is never a duplicate of yesterday's.
        let crosses_day = action == Action::DailyLogin && utc_date(last) != utc_date(now_ms);
        if !crosses_day && now_ms.saturating_sub(last) < debounce_ms {
            return Err(Rejection::Duplicate);
        }
    }

    match action {
        Action::DailyLogin => {
            let today = utc_date(now_ms);
            if record.last_login_date.is_some_and(|d| d >= today) {
                return Err(Rejection::AlreadyClaimedToday);
            }
        }
        Action::SbtClaim => {
            if record.sbt_claimed {
                return Err(Rejection::AlreadyClaimed);
            }
        }
        Action::Swap | Action::NftCreate | Action::NftSell | Action::NftBuy => {}
    }

    if action.requires_proof() && !has_transaction_hash(metadata) {
        return Err(Rejection::UnverifiedSwap);
    }

    Ok(())
}

fn has_transaction_hash(metadata: Option<&Metadata>) -> bool {
    metadata
        .and_then(|m| m.get("transactionHash"))
        .and_then(|v| v.as_str())
        .is_some_and(|h| !h.trim().is_empty())
}

/// Apply a granted award: credit XP, set action flags, log the transaction,
/// and record the debounce key.
pub fn apply_grant(record: &mut AccountRecord, tx: Transaction, history_limit: usize) {
    let action = tx.action;
    let now_ms = tx.timestamp;

    record.total_xp = record.total_xp.saturating_add(tx.xp_amount);
    match action {
        Action::DailyLogin => record.last_login_date = Some(utc_date(now_ms)),
        Action::SbtClaim => record.sbt_claimed = true,
        _ => {}
    }
    record.last_granted.insert(action, now_ms);
    record.push_transaction(tx, history_limit);
}
