//! Request and response types for the ledger API.

use crate::ledger::{AccountView, Award, Metadata, Rejection};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/xp`. Fields are optional so missing ones surface as
/// validation errors rather than JSON rejections.
#[derive(Debug, Deserialize)]
pub struct AwardRequest {
    #[serde(default)]
    pub wallet: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// Body of the fixed-action endpoints.
#[derive(Debug, Deserialize)]
pub struct WalletRequest {
    #[serde(default)]
    pub wallet: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WalletQuery {
    #[serde(default)]
    pub wallet: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Response from the award endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp_earned: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_number: Option<u64>,
    #[serde(rename = "userXP", skip_serializing_if = "Option::is_none")]
    pub user_xp: Option<AccountView>,
}

impl AwardResponse {
    /// Malformed input. `account` is present when the wallet itself was valid.
    pub fn invalid(message: impl Into<String>, account: Option<AccountView>) -> Self {
        Self {
            success: false,
            xp_earned: None,
            message: Some(message.into()),
            reason: Some("invalid request"),
            claim_number: None,
            user_xp: account,
        }
    }

    /// Map a ledger outcome to its HTTP status and body.
    ///
    /// Duplicates are 429, an unverified swap is a client error (400), other
    /// rule rejections are 200 with `success: false`.
    pub fn from_award(award: Award) -> (StatusCode, Self) {
        match award {
            Award::Granted {
                xp_earned,
                claim_number,
                account,
            } => (
                StatusCode::OK,
                Self {
                    success: true,
                    xp_earned: Some(xp_earned),
                    message: Some(format!("Earned {xp_earned} XP")),
                    reason: None,
                    claim_number,
                    user_xp: Some(account),
                },
            ),
            Award::Rejected { rejection, account } => (
                rejection_status(rejection),
                Self {
                    success: false,
                    xp_earned: None,
                    message: Some(rejection.message().to_string()),
                    reason: Some(rejection.reason()),
                    claim_number: None,
                    user_xp: Some(account),
                },
            ),
        }
    }
}

pub fn rejection_status(rejection: Rejection) -> StatusCode {
    match rejection {
        Rejection::Duplicate => StatusCode::TOO_MANY_REQUESTS,
        Rejection::UnverifiedSwap => StatusCode::BAD_REQUEST,
        Rejection::AlreadyClaimedToday | Rejection::AlreadyClaimed | Rejection::LimitReached => {
            StatusCode::OK
        }
    }
}

/// Error body for read endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Response from `GET /api/sbt/status`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SbtStatusResponse {
    pub wallet_address: String,
    #[serde(flatten)]
    pub eligibility: crate::ledger::SbtEligibility,
}

/// Response from `GET /api/leaderboard`.
#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub entries: Vec<crate::ledger::LeaderboardEntry>,
}

/// Response from the health endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub store_backend: &'static str,
    pub uptime_secs: u64,
    pub requests: u64,
    pub accounts: usize,
    pub sbt_claimed: u64,
    pub sbt_capacity: u64,
}
