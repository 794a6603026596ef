//! Award endpoint behaviour: grants, debounce, daily login, swap proof, and
//! input validation, driven through the router.

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use xp_types::level_for;

use crate::utils::{TestApp, DAY_MS, NOON_JAN_1};

#[tokio::test]
async fn test_nft_buy_on_fresh_wallet() -> Result<()> {
    let app = TestApp::new();
    let r = app.award("0xabc", "NFT_BUY").await?;

    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.json["success"], true);
    assert_eq!(r.json["xpEarned"], 100);
    assert_eq!(r.json["userXP"]["totalXP"], 100);
    assert_eq!(r.json["userXP"]["level"], 1);
    assert_eq!(r.json["userXP"]["transactions"][0]["action"], "NFT_BUY");
    assert_eq!(r.json["userXP"]["transactions"][0]["xpAmount"], 100);
    Ok(())
}

#[tokio::test]
async fn test_wallet_is_case_insensitive() -> Result<()> {
    let app = TestApp::new();
    app.award("0xABCdef", "NFT_CREATE").await?;

    let r = app.get("/api/xp?wallet=0xabcdef").await?;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.json["walletAddress"], "0xabcdef");
    assert_eq!(r.json["totalXP"], 100);
    Ok(())
}

#[tokio::test]
async fn test_unknown_wallet_reads_as_zero() -> Result<()> {
    let app = TestApp::new();
    let r = app.get("/api/xp?wallet=0x1234").await?;

    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.json["totalXP"], 0);
    assert_eq!(r.json["level"], 0);
    assert_eq!(r.json["sbtClaimed"], false);
    assert_eq!(r.json["transactions"], json!([]));
    assert_eq!(app.state.ledger.store().account_count()?, 0);
    Ok(())
}

#[tokio::test]
async fn test_swap_without_hash_at_level_three() -> Result<()> {
    let app = TestApp::new();
    for action in ["NFT_CREATE", "NFT_SELL", "NFT_BUY"] {
        for _ in 0..3 {
            assert_eq!(app.award("0xabc", action).await?.json["success"], true);
            app.advance_past_debounce();
        }
    }

    let r = app.award("0xabc", "SWAP").await?;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);
    assert_eq!(r.json["success"], false);
    assert_eq!(r.json["reason"], "unverified swap");
    assert_eq!(r.json["userXP"]["totalXP"], 900);
    assert_eq!(r.json["userXP"]["level"], 3);
    Ok(())
}

#[tokio::test]
async fn test_swap_resubmit_with_new_hash_is_duplicate() -> Result<()> {
    let app = TestApp::new();
    let first = app
        .post(
            "/api/xp",
            json!({"wallet": "0xabc", "action": "SWAP", "metadata": {"transactionHash": "0x1"}}),
        )
        .await?;
    assert_eq!(first.status, StatusCode::OK);

    let second = app
        .post(
            "/api/xp",
            json!({"wallet": "0xabc", "action": "SWAP", "metadata": {"transactionHash": "0x2"}}),
        )
        .await?;
    assert_eq!(second.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(second.json["reason"], "duplicate");
    assert_eq!(second.json["userXP"]["totalXP"], 100);
    assert_eq!(
        second.json["userXP"]["transactions"][0]["metadata"]["transactionHash"],
        "0x1"
    );
    Ok(())
}

#[tokio::test]
async fn test_daily_login_across_utc_midnight() -> Result<()> {
    let app = TestApp::new();
    let midnight = NOON_JAN_1 - DAY_MS / 2 + DAY_MS;

    app.clock.set(midnight - 1_000); // 23:59:59
    let late = app.post("/api/xp/daily-login", json!({"wallet": "0xabc"})).await?;
    assert_eq!(late.json["success"], true);
    assert_eq!(late.json["userXP"]["lastLoginDate"], "2024-01-01");

    app.clock.set(midnight + 1_000); // 00:00:01
    let early = app.post("/api/xp/daily-login", json!({"wallet": "0xabc"})).await?;
    assert_eq!(early.json["success"], true);
    assert_eq!(early.json["userXP"]["totalXP"], 200);
    assert_eq!(early.json["userXP"]["lastLoginDate"], "2024-01-02");
    Ok(())
}

#[tokio::test]
async fn test_daily_login_twice_same_date() -> Result<()> {
    let app = TestApp::new();
    app.post("/api/xp/daily-login", json!({"wallet": "0xabc"})).await?;
    app.clock.advance_ms(2 * 3_600_000);

    let r = app.post("/api/xp/daily-login", json!({"wallet": "0xabc"})).await?;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.json["success"], false);
    assert_eq!(r.json["reason"], "already claimed today");
    assert_eq!(r.json["userXP"]["totalXP"], 100);
    Ok(())
}

#[tokio::test]
async fn test_history_is_capped_at_most_recent() -> Result<()> {
    let app = TestApp::new();
    let mut last_total = 0;
    for _ in 0..105 {
        let r = app.award("0xabc", "NFT_BUY").await?;
        let total = r.json["userXP"]["totalXP"].as_u64().unwrap_or_default();
        assert!(total >= last_total);
        assert_eq!(r.json["userXP"]["level"], level_for(total));
        last_total = total;
        app.advance_past_debounce();
    }

    let r = app.get("/api/xp?wallet=0xabc").await?;
    let txs = r.json["transactions"].as_array().cloned().unwrap_or_default();
    assert_eq!(txs.len(), 100);
    assert_eq!(r.json["totalXP"], 10_500);

    let ids: Vec<&str> = txs.iter().filter_map(|t| t["id"].as_str()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);

    // Oldest five were evicted.
    let step = app.state.config.debounce_ms + 1;
    assert_eq!(txs[0]["timestamp"], NOON_JAN_1 + 5 * step);
    Ok(())
}

#[tokio::test]
async fn test_validation_failures_are_400() -> Result<()> {
    let app = TestApp::new();

    let missing = app.post("/api/xp", json!({"action": "NFT_BUY"})).await?;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert!(missing.json.get("userXP").is_none());

    let malformed = app.award("not-a-wallet", "NFT_BUY").await?;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);

    let unknown = app.award("0xabc", "nft_buy").await?;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown.json["userXP"]["walletAddress"], "0xabc");

    let no_action = app.post("/api/xp", json!({"wallet": "0xabc"})).await?;
    assert_eq!(no_action.status, StatusCode::BAD_REQUEST);

    let bad_json = app
        .send(
            axum::http::Method::POST,
            "/api/xp",
            Some("{not json".into()),
            &[],
        )
        .await?;
    assert_eq!(bad_json.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_json.json["success"], false);

    let bad_query = app.get("/api/xp?wallet=").await?;
    assert_eq!(bad_query.status, StatusCode::BAD_REQUEST);

    assert_eq!(app.state.ledger.store().account_count()?, 0);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_identical_awards_grant_once() -> Result<()> {
    let app = std::sync::Arc::new(TestApp::new());
    let mut handles = Vec::new();
    for _ in 0..12 {
        let app = std::sync::Arc::clone(&app);
        handles.push(tokio::spawn(async move {
            app.award("0xabc", "NFT_SELL").await.map(|r| r.status)
        }));
    }

    let mut granted = 0;
    for h in handles {
        if h.await?? == StatusCode::OK {
            granted += 1;
        }
    }
    assert_eq!(granted, 1);
    let r = app.get("/api/xp?wallet=0xabc").await?;
    assert_eq!(r.json["totalXP"], 100);
    Ok(())
}

#[tokio::test]
async fn test_oversized_metadata_is_rejected_without_write() -> Result<()> {
    let config = xp_ledger::Config {
        max_metadata_bytes: 64,
        ..xp_ledger::Config::default()
    };
    let app = TestApp::with_config(config);
    let hash = format!("0x{}", "a".repeat(128));

    let r = app
        .post(
            "/api/xp",
            json!({"wallet": "0xabc", "action": "SWAP", "metadata": {"transactionHash": hash}}),
        )
        .await?;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);
    assert_eq!(r.json["success"], false);
    assert_eq!(r.json["reason"], "invalid request");
    assert_eq!(r.json["userXP"]["totalXP"], 0);
    assert_eq!(app.state.ledger.store().account_count()?, 0);

    let r = app
        .post(
            "/api/xp",
            json!({"wallet": "0xabc", "action": "SWAP", "metadata": {"transactionHash": "0x1"}}),
        )
        .await?;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.json["xpEarned"], 100);
    Ok(())
}
