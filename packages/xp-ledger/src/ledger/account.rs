//! Account record, transaction log, and the public account view.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, VecDeque};
use xp_types::{level_for, Action, WalletAddress};

/// Opaque key-value bag attached to a transaction (e.g. `transactionHash`).
pub type Metadata = Map<String, Value>;

/// Immutable record of one XP award.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Sortable by creation; see [`super::TxIdGenerator`].
    pub id: String,
    pub wallet_address: WalletAddress,
    pub action: Action,
    pub xp_amount: u64,
    /// Epoch milliseconds.
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Persisted account state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub wallet_address: WalletAddress,
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    #[serde(default)]
    pub sbt_claimed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_date: Option<NaiveDate>,
    /// Oldest first.
    #[serde(default)]
    pub transactions: VecDeque<Transaction>,
    /// Epoch ms of the last grant per action. Drives duplicate suppression and
    /// is committed together with the balance.
    #[serde(default)]
    pub last_granted: BTreeMap<Action, u64>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub created_at: u64,
}

impl AccountRecord {
    pub fn new(wallet_address: WalletAddress, created_at: u64) -> Self {
        Self {
            wallet_address,
            total_xp: 0,
            sbt_claimed: false,
            last_login_date: None,
            transactions: VecDeque::new(),
            last_granted: BTreeMap::new(),
            version: 0,
            created_at,
        }
    }

    pub fn level(&self) -> u64 {
        level_for(self.total_xp)
    }

    /// Append a transaction and evict the oldest beyond `limit`.
    pub fn push_transaction(&mut self, tx: Transaction, limit: usize) {
        self.transactions.push_back(tx);
        while self.transactions.len() > limit {
            self.transactions.pop_front();
        }
    }

    pub fn view(&self) -> AccountView {
        AccountView {
            wallet_address: self.wallet_address.clone(),
            total_xp: self.total_xp,
            level: self.level(),
            sbt_claimed: self.sbt_claimed,
            last_login_date: self.last_login_date,
            transactions: self.transactions.iter().cloned().collect(),
        }
    }
}

/// What callers see. `level` is derived on every render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub wallet_address: WalletAddress,
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    pub level: u64,
    pub sbt_claimed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_date: Option<NaiveDate>,
    pub transactions: Vec<Transaction>,
}

impl AccountView {
    /// Zero-valued view for a wallet with no account yet.
    pub fn empty(wallet_address: WalletAddress) -> Self {
        Self {
            wallet_address,
            total_xp: 0,
            level: 0,
            sbt_claimed: false,
            last_login_date: None,
            transactions: Vec::new(),
        }
    }
}
