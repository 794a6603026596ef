//! Shared types and pure-logic utilities for the XP ledger.
//! No I/O and no async runtime, usable from the service and from clients.

mod action;
mod error;
mod level;
mod wallet;

pub use action::Action;
pub use error::ValidationError;
pub use level::level_for;
pub use wallet::{normalize_wallet, WalletAddress};
