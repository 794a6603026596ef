//! Prometheus metrics (lock-free atomics, zero allocation on hot path).

use crate::ledger::Rejection;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    // --- Traffic ---
    pub award_requests: AtomicU64,
    pub award_granted: AtomicU64,
    pub xp_granted: AtomicU64,
    pub validation_errors: AtomicU64,
    pub storage_errors: AtomicU64,

    // --- Rejections by reason ---
    pub rejected_duplicate: AtomicU64,
    pub rejected_claimed_today: AtomicU64,
    pub rejected_sbt_claimed: AtomicU64,
    pub rejected_sbt_limit: AtomicU64,
    pub rejected_unverified_swap: AtomicU64,

    // --- Latency (μs, updated via CAS) ---
    pub award_duration_us_sum: AtomicU64,
    pub award_duration_us_max: AtomicU64,
}

impl Metrics {
    const fn new() -> Self {
        Self {
            award_requests: AtomicU64::new(0),
            award_granted: AtomicU64::new(0),
            xp_granted: AtomicU64::new(0),
            validation_errors: AtomicU64::new(0),
            storage_errors: AtomicU64::new(0),
            rejected_duplicate: AtomicU64::new(0),
            rejected_claimed_today: AtomicU64::new(0),
            rejected_sbt_claimed: AtomicU64::new(0),
            rejected_sbt_limit: AtomicU64::new(0),
            rejected_unverified_swap: AtomicU64::new(0),
            award_duration_us_sum: AtomicU64::new(0),
            award_duration_us_max: AtomicU64::new(0),
        }
    }

    pub fn record_grant(&self, xp: u64) {
        self.award_granted.fetch_add(1, Ordering::Relaxed);
        self.xp_granted.fetch_add(xp, Ordering::Relaxed);
    }

    pub fn record_rejection(&self, rejection: Rejection) {
        let counter = match rejection {
            Rejection::Duplicate => &self.rejected_duplicate,
            Rejection::AlreadyClaimedToday => &self.rejected_claimed_today,
            Rejection::AlreadyClaimed => &self.rejected_sbt_claimed,
            Rejection::LimitReached => &self.rejected_sbt_limit,
            Rejection::UnverifiedSwap => &self.rejected_unverified_swap,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_award_duration(&self, start: Instant) {
        let us = start.elapsed().as_micros() as u64;
        self.award_duration_us_sum.fetch_add(us, Ordering::Relaxed);
        // CAS loop for max tracking
        let mut cur = self.award_duration_us_max.load(Ordering::Relaxed);
        while us > cur {
            match self.award_duration_us_max.compare_exchange_weak(
                cur,
                us,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => cur = actual,
            }
        }
    }

    /// Render in Prometheus text exposition format.
    pub fn render(&self, accounts: usize, sbt_claimed: u64, sbt_capacity: u64) -> String {
        let requests = self.award_requests.load(Ordering::Relaxed);
        let granted = self.award_granted.load(Ordering::Relaxed);
        let xp = self.xp_granted.load(Ordering::Relaxed);
        let validation = self.validation_errors.load(Ordering::Relaxed);
        let storage = self.storage_errors.load(Ordering::Relaxed);
        let dup = self.rejected_duplicate.load(Ordering::Relaxed);
        let today = self.rejected_claimed_today.load(Ordering::Relaxed);
        let sbt_claimed_rej = self.rejected_sbt_claimed.load(Ordering::Relaxed);
        let sbt_limit = self.rejected_sbt_limit.load(Ordering::Relaxed);
        let unverified = self.rejected_unverified_swap.load(Ordering::Relaxed);
        let dur_sum = self.award_duration_us_sum.load(Ordering::Relaxed);
        let dur_max = self.award_duration_us_max.swap(0, Ordering::Relaxed);

        // Convert μs to seconds for Prometheus conventions
        let dur_sum_s = dur_sum as f64 / 1_000_000.0;
        let dur_max_s = dur_max as f64 / 1_000_000.0;

        format!(
            "\
# HELP xp_award_requests_total Total award requests received.\n\
# TYPE xp_award_requests_total counter\n\
xp_award_requests_total {requests}\n\
# HELP xp_award_granted_total Awards that credited XP.\n\
# TYPE xp_award_granted_total counter\n\
xp_award_granted_total {granted}\n\
# HELP xp_granted_points_total XP credited across all wallets.\n\
# TYPE xp_granted_points_total counter\n\
xp_granted_points_total {xp}\n\
# HELP xp_award_rejected_total Awards refused by ledger rules.\n\
# TYPE xp_award_rejected_total counter\n\
xp_award_rejected_total{{reason=\"duplicate\"}} {dup}\n\
xp_award_rejected_total{{reason=\"already_claimed_today\"}} {today}\n\
xp_award_rejected_total{{reason=\"already_claimed\"}} {sbt_claimed_rej}\n\
xp_award_rejected_total{{reason=\"limit_reached\"}} {sbt_limit}\n\
xp_award_rejected_total{{reason=\"unverified_swap\"}} {unverified}\n\
# HELP xp_validation_errors_total Malformed requests (bad wallet, unknown action, bad JSON).\n\
# TYPE xp_validation_errors_total counter\n\
xp_validation_errors_total {validation}\n\
# HELP xp_storage_errors_total Store failures surfaced as HTTP 500.\n\
# TYPE xp_storage_errors_total counter\n\
xp_storage_errors_total {storage}\n\
# HELP xp_award_duration_seconds_sum Total award handler time (seconds).\n\
# TYPE xp_award_duration_seconds_sum counter\n\
xp_award_duration_seconds_sum {dur_sum_s:.6}\n\
# HELP xp_award_duration_seconds_max Max award handler time since last scrape (seconds).\n\
# TYPE xp_award_duration_seconds_max gauge\n\
xp_award_duration_seconds_max {dur_max_s:.6}\n\
# HELP xp_accounts Accounts in the store.\n\
# TYPE xp_accounts gauge\n\
xp_accounts {accounts}\n\
# HELP xp_sbt_claimed Wallets in the SBT claim registry.\n\
# TYPE xp_sbt_claimed gauge\n\
xp_sbt_claimed {sbt_claimed}\n\
# HELP xp_sbt_capacity SBT program capacity.\n\
# TYPE xp_sbt_capacity gauge\n\
xp_sbt_capacity {sbt_capacity}\n"
        )
    }
}
