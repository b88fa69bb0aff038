//! Coin balance, ledger, and spend integration tests.

mod common;

use common::TestHarness;
use serde_json::json;

async fn grant(harness: &TestHarness, amount: i64, xp: i64) {
    harness
        .server
        .post("/v1/coins/earn")
        .add_header("x-admin-key", harness.admin_api_key.as_str())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "amount": amount,
            "xp": xp,
            "reason": "Seed grant",
        }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn fresh_user_has_zero_balance() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/coins/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 0);
    assert_eq!(body["total_xp"], 0);
    assert_eq!(body["current_streak"], 0);
    assert_eq!(body["rank"], "nacom");
    assert_eq!(body["rank_multiplier"], 1.0);
}

#[tokio::test]
async fn balance_requires_auth() {
    let harness = TestHarness::new();

    harness
        .server
        .get("/v1/coins/balance")
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn admin_grant_credits_coins_and_xp() {
    let harness = TestHarness::new();

    grant(&harness, 100, 50).await;

    let response = harness
        .server
        .get("/v1/coins/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 100);
    assert_eq!(body["earned_total"], 100);
    assert_eq!(body["total_xp"], 50);
}

#[tokio::test]
async fn grant_requires_admin_key() {
    let harness = TestHarness::new();

    // Service key is not enough for admin endpoints.
    harness
        .server
        .post("/v1/coins/earn")
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "amount": 100,
            "reason": "nope",
        }))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn spend_debits_and_records_transaction() {
    let harness = TestHarness::new();
    grant(&harness, 100, 0).await;

    let response = harness
        .server
        .post("/v1/coins/spend")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "amount": 40,
            "reason": "Hint power-up",
            "reference_id": "powerup:hint",
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 60);
    assert_eq!(body["transaction"]["amount"], -40);
    assert_eq!(body["transaction"]["transaction_type"], "spent_powerup");
    assert_eq!(body["transaction"]["balance_after"], 60);
}

#[tokio::test]
async fn overdraft_is_rejected_without_a_ledger_row() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/coins/spend")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "amount": 50, "reason": "Too expensive" }))
        .await;

    response.assert_status_bad_request();
    let error: serde_json::Value = response.json();
    assert_eq!(error["error"]["code"], "insufficient_funds");
    assert_eq!(error["error"]["details"]["balance"], 0);
    assert_eq!(error["error"]["details"]["required"], 50);

    // The failed spend left no trace in the ledger.
    let transactions = harness
        .server
        .get("/v1/coins/transactions")
        .add_header("authorization", harness.user_auth_header())
        .await;
    transactions.assert_status_ok();
    let body: serde_json::Value = transactions.json();
    assert!(body["transactions"].as_array().unwrap().is_empty());
    assert_eq!(body["has_more"], false);
}

#[tokio::test]
async fn transactions_paginate_with_has_more() {
    let harness = TestHarness::new();
    grant(&harness, 10, 0).await;
    grant(&harness, 20, 0).await;
    grant(&harness, 30, 0).await;

    let response = harness
        .server
        .get("/v1/coins/transactions?limit=2")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(body["has_more"], true);

    let rest = harness
        .server
        .get("/v1/coins/transactions?limit=2&offset=2")
        .add_header("authorization", harness.user_auth_header())
        .await;
    rest.assert_status_ok();
    let body: serde_json::Value = rest.json();
    assert_eq!(body["transactions"].as_array().unwrap().len(), 1);
    assert_eq!(body["has_more"], false);
}

#[tokio::test]
async fn spend_rejects_non_positive_amounts() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/coins/spend")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "amount": 0, "reason": "free" }))
        .await;

    response.assert_status_bad_request();
    let error: serde_json::Value = response.json();
    assert_eq!(error["error"]["code"], "validation_error");
}
