//! SBT claim and eligibility endpoints.

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use xp_ledger::Config;
use xp_types::WalletAddress;

use crate::utils::TestApp;

#[tokio::test]
async fn test_claim_once_then_already_claimed() -> Result<()> {
    let app = TestApp::new();

    let first = app.post("/api/sbt/claim", json!({"wallet": "0xabc"})).await?;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.json["success"], true);
    assert_eq!(first.json["xpEarned"], 1000);
    assert_eq!(first.json["claimNumber"], 1);
    assert_eq!(first.json["userXP"]["sbtClaimed"], true);

    for _ in 0..4 {
        app.advance_past_debounce();
        let again = app.post("/api/sbt/claim", json!({"wallet": "0xABC"})).await?;
        assert_eq!(again.status, StatusCode::OK);
        assert_eq!(again.json["success"], false);
        assert_eq!(again.json["reason"], "already claimed");
    }

    // The generic endpoint is gated the same way.
    app.advance_past_debounce();
    let generic = app.award("0xabc", "SBT_CLAIM").await?;
    assert_eq!(generic.json["reason"], "already claimed");

    let account = app.get("/api/xp?wallet=0xabc").await?;
    assert_eq!(account.json["totalXP"], 1000);
    assert_eq!(account.json["level"], 3);
    Ok(())
}

#[tokio::test]
async fn test_status_reflects_claims() -> Result<()> {
    let app = TestApp::new();

    let before = app.get("/api/sbt/status?wallet=0xabc").await?;
    assert_eq!(before.status, StatusCode::OK);
    assert_eq!(before.json["walletAddress"], "0xabc");
    assert_eq!(before.json["canClaim"], true);
    assert_eq!(before.json["remaining"], 20_000);

    app.post("/api/sbt/claim", json!({"wallet": "0xabc"})).await?;

    let after = app.get("/api/sbt/status?wallet=0xabc").await?;
    assert_eq!(after.json["canClaim"], false);
    assert_eq!(after.json["alreadyClaimed"], true);
    assert_eq!(after.json["totalClaimed"], 1);
    assert_eq!(after.json["remaining"], 19_999);

    let missing = app.get("/api/sbt/status").await?;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_capacity_boundary_at_default_limit() -> Result<()> {
    let app = TestApp::new();
    let capacity = app.state.config.sbt_capacity;
    assert_eq!(capacity, 20_000);

    for n in 1..=capacity {
        let wallet: WalletAddress = format!("0x{n:x}").parse()?;
        assert!(app.state.ledger.claim_sbt(&wallet).await?.is_granted());
    }

    let late = app.post("/api/sbt/claim", json!({"wallet": "0xfeedface"})).await?;
    assert_eq!(late.status, StatusCode::OK);
    assert_eq!(late.json["success"], false);
    assert_eq!(late.json["reason"], "limit reached");
    assert_eq!(late.json["userXP"]["totalXP"], 0);

    let late_status = app.get("/api/sbt/status?wallet=0xfeedface").await?;
    assert_eq!(late_status.json["limitReached"], true);
    assert_eq!(late_status.json["alreadyClaimed"], false);
    assert_eq!(late_status.json["remaining"], 0);

    let early_status = app.get("/api/sbt/status?wallet=0x1").await?;
    assert_eq!(early_status.json["alreadyClaimed"], true);
    assert_eq!(early_status.json["canClaim"], false);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_claims_never_exceed_capacity() -> Result<()> {
    let app = std::sync::Arc::new(TestApp::with_config(Config {
        sbt_capacity: 5,
        ..Config::default()
    }));

    let mut handles = Vec::new();
    for n in 1..=20u32 {
        let app = std::sync::Arc::clone(&app);
        handles.push(tokio::spawn(async move {
            app.post("/api/sbt/claim", json!({ "wallet": format!("0x{n:x}") }))
                .await
                .map(|r| r.json["claimNumber"].as_u64())
        }));
    }

    let mut numbers = Vec::new();
    for h in handles {
        if let Some(n) = h.await?? {
            numbers.push(n);
        }
    }
    numbers.sort_unstable();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    assert_eq!(app.state.ledger.store().sbt_claimed_total()?, 5);
    Ok(())
}
