//! Wallet address identity.
//!
//! Addresses are case-insensitive; the canonical form is the lower-cased
//! `0x`-prefixed hex string.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 20-byte EVM address = 40 hex digits.
const MAX_HEX_DIGITS: usize = 40;

/// Canonical (lower-case) wallet address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WalletAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize_wallet(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        normalize_wallet(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(w: WalletAddress) -> Self {
        w.0
    }
}

impl AsRef<str> for WalletAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate and lower-case a wallet address.
///
/// Accepts `0x` (any case) followed by 1..=40 hex digits. Surrounding
/// whitespace is ignored.
pub fn normalize_wallet(raw: &str) -> Result<WalletAddress, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingWallet);
    }

    let lower = trimmed.to_ascii_lowercase();
    let hex = lower
        .strip_prefix("0x")
        .ok_or_else(|| ValidationError::MalformedWallet(trimmed.to_string()))?;

    if hex.is_empty()
        || hex.len() > MAX_HEX_DIGITS
        || !hex.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return Err(ValidationError::MalformedWallet(trimmed.to_string()));
    }

    Ok(WalletAddress(lower))
}
