//! Ledger service configuration.
//!
//! Loaded from an optional `xp-ledger.toml`, then overridden by `LEDGER_*`
//! environment variables (nested keys use `__`, e.g. `LEDGER_STORAGE__PATH`).

use serde::Deserialize;
use std::time::Duration;

/// Hard ceiling on retained transactions per account.
pub const MAX_HISTORY_LIMIT: usize = 100;

/// Configuration for the XP ledger service.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "defaults::bind_address")]
    pub bind_address: String,

    /// Window in which a repeated `(wallet, action)` grant is suppressed.
    #[serde(default = "defaults::debounce_ms")]
    pub debounce_ms: u64,

    /// Transactions retained per account (1..=100); oldest are evicted first.
    #[serde(default = "defaults::history_limit")]
    pub history_limit: usize,

    /// Maximum number of wallets that may ever claim the SBT.
    #[serde(default = "defaults::sbt_capacity")]
    pub sbt_capacity: u64,

    #[serde(default = "defaults::request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Largest accepted award `metadata`, measured as serialized JSON.
    #[serde(default = "defaults::max_metadata_bytes")]
    pub max_metadata_bytes: usize,

    /// Shared secret for mutating routes. Unset or empty disables the check.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local maps. State is lost on restart.
    Memory,
    /// In-memory maps backed by a JSON snapshot file.
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::backend")]
    pub backend: StorageBackend,

    #[serde(default = "defaults::storage_path")]
    pub path: String,

    /// 0 = write-through: every commit rewrites the full snapshot before it
    /// returns, which serializes awards behind disk I/O on large ledgers.
    #[serde(default = "defaults::flush_interval_secs")]
    pub flush_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: defaults::bind_address(),
            debounce_ms: defaults::debounce_ms(),
            history_limit: defaults::history_limit(),
            sbt_capacity: defaults::sbt_capacity(),
            request_timeout_secs: defaults::request_timeout_secs(),
            max_metadata_bytes: defaults::max_metadata_bytes(),
            api_key: None,
            storage: StorageConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: defaults::backend(),
            path: defaults::storage_path(),
            flush_interval_secs: defaults::flush_interval_secs(),
        }
    }
}

impl Config {
    /// Load from `xp-ledger.toml` (optional) and the environment.
    pub fn load() -> Result<Self, crate::Error> {
        config::Config::builder()
            .add_source(config::File::with_name("xp-ledger").required(false))
            .add_source(
                config::Environment::with_prefix("LEDGER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize::<Config>())
            .map_err(|e| crate::Error::Config(e.to_string()))
            .and_then(Config::validated)
    }

    /// Reject values that would break ledger invariants.
    pub fn validated(mut self) -> Result<Self, crate::Error> {
        self.api_key = self
            .api_key
            .take()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        if !(1..=MAX_HISTORY_LIMIT).contains(&self.history_limit) {
            return Err(crate::Error::Config(format!(
                "history_limit must be between 1 and {MAX_HISTORY_LIMIT}"
            )));
        }
        if self.debounce_ms == 0 {
            return Err(crate::Error::Config(
                "debounce_ms must be at least 1".into(),
            ));
        }
        if self.max_metadata_bytes == 0 {
            return Err(crate::Error::Config(
                "max_metadata_bytes must be at least 1".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::Config(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        if self.storage.backend == StorageBackend::File && self.storage.path.trim().is_empty() {
            return Err(crate::Error::Config(
                "storage.path is required for the file backend".into(),
            ));
        }
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

mod defaults {
    use super::StorageBackend;

    pub fn bind_address() -> String {
        "0.0.0.0:3050".into()
    }

    pub fn debounce_ms() -> u64 {
        5_000
    }

    pub fn history_limit() -> usize {
        100
    }

    pub fn sbt_capacity() -> u64 {
        20_000
    }

    pub fn request_timeout_secs() -> u64 {
        10
    }

    pub fn max_metadata_bytes() -> usize {
        4_096
    }

    pub fn backend() -> StorageBackend {
        StorageBackend::File
    }

    pub fn storage_path() -> String {
        "./data/xp-ledger.json".into()
    }

    pub fn flush_interval_secs() -> u64 {
        5
    }
}
