//! # XP Ledger
//!
//! Per-wallet experience points, levels, and reward gating behind a small
//! HTTP API. Every award is debounced, checked against action rules, and
//! committed atomically with its transaction record.
//!
//! ## Quick Start
//! ```bash
//! cargo run --bin xp-ledger
//! ```
//!
//! ## Endpoints
//! - `GET /api/xp?wallet=` - Account view (zero-valued for unknown wallets)
//! - `POST /api/xp` - Award XP for an action
//! - `POST /api/xp/daily-login` - Daily login reward
//! - `POST /api/sbt/claim` - Claim the soulbound token
//! - `GET /api/sbt/status?wallet=` - SBT eligibility
//! - `GET /api/leaderboard?limit=` - Top accounts by XP
//! - `GET /health`, `GET /ready`, `GET /metrics`

pub mod config;
mod error;
mod handlers;
pub mod ledger;
pub mod metrics;
pub mod middleware;
mod response;
mod router;
mod state;
pub mod store;

pub use config::Config;
pub use error::Error;
pub use ledger::{Award, Ledger, LedgerSettings};
pub use router::create as create_router;
pub use state::AppState;
