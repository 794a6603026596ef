//! Per-wallet critical sections.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use xp_types::WalletAddress;

/// Idle entries are pruned once the table grows past this.
const PRUNE_THRESHOLD: usize = 4_096;

/// One async mutex per wallet, created on demand.
#[derive(Default)]
pub struct WalletLocks {
    table: Mutex<HashMap<WalletAddress, Arc<AsyncMutex<()>>>>,
}

impl WalletLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold the returned guard across read-check-commit for `wallet`.
    pub async fn lock(&self, wallet: &WalletAddress) -> OwnedMutexGuard<()> {
        let slot = {
            let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
            if table.len() >= PRUNE_THRESHOLD {
                // strong_count == 1 means only the table holds it: nobody is
                // waiting or inside. Safe while the table lock is held.
                table.retain(|_, m| Arc::strong_count(m) > 1);
            }
            Arc::clone(table.entry(wallet.clone()).or_default())
        };
        slot.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
