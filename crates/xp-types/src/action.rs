//! Fixed reward catalog.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An XP-earning event. Each action maps to exactly one XP amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    DailyLogin,
    Swap,
    NftCreate,
    NftSell,
    NftBuy,
    SbtClaim,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::DailyLogin,
        Action::Swap,
        Action::NftCreate,
        Action::NftSell,
        Action::NftBuy,
        Action::SbtClaim,
    ];

    /// XP granted for one successful award of this action.
    pub const fn xp_amount(self) -> u64 {
        match self {
            Action::SbtClaim => 1000,
            Action::DailyLogin
            | Action::Swap
            | Action::NftCreate
            | Action::NftSell
            | Action::NftBuy => 100,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Action::DailyLogin => "DAILY_LOGIN",
            Action::Swap => "SWAP",
            Action::NftCreate => "NFT_CREATE",
            Action::NftSell => "NFT_SELL",
            Action::NftBuy => "NFT_BUY",
            Action::SbtClaim => "SBT_CLAIM",
        }
    }

    /// Only swaps need external proof (a submitted transaction hash).
    pub const fn requires_proof(self) -> bool {
        matches!(self, Action::Swap)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownAction(s.to_string()))
    }
}
