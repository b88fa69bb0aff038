//! Rank progression integration tests.

mod common;

use common::TestHarness;
use ml_rewards_core::EconomyState;
use ml_rewards_store::Store;

/// Seed an economy record strong enough for the given thresholds.
fn seed_economy(
    harness: &TestHarness,
    total_xp: i64,
    earned_total: i64,
    modules: u64,
    achievements: u64,
    average: u64,
) {
    let mut economy = EconomyState::new(harness.test_user_id);
    economy.total_xp = total_xp;
    economy.earned_total = earned_total;
    economy.balance = earned_total;
    economy.stats.modules_completed = modules;
    economy.stats.achievements_unlocked = achievements;
    economy.stats.score_sum = average * 10;
    economy.stats.score_count = 10;
    harness.store.put_economy(&economy).unwrap();
}

#[tokio::test]
async fn fresh_user_starts_at_nacom() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/ranks/me")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["rank"], "nacom");
    assert_eq!(body["multiplier"], 1.0);
    assert_eq!(body["next_rank"], "batab");
    assert_eq!(body["eligible"], false);
    assert!(!body["unmet"].as_array().unwrap().is_empty());
    assert!(body["history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn promotion_climbs_one_rank_and_pays_the_bonus() {
    let harness = TestHarness::new();
    // Meets batab and holcatte thresholds, short of guerrero's XP.
    seed_economy(&harness, 700, 300, 1, 3, 70);

    let response = harness
        .server
        .post("/v1/ranks/promote")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["record"]["rank"], "batab");
    assert_eq!(body["record"]["previous_rank"], "nacom");
    assert_eq!(body["record"]["bonus_coins"], 50);
    assert_eq!(body["balance"], 350);
    assert_eq!(body["transaction"]["transaction_type"], "earned_rank");

    // Second promotion reaches holcatte.
    let response = harness
        .server
        .post("/v1/ranks/promote")
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["record"]["rank"], "holcatte");
    assert_eq!(body["record"]["bonus_coins"], 100);

    // Guerrero needs 1500 XP; the shortfall is spelled out.
    let response = harness
        .server
        .post("/v1/ranks/promote")
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_bad_request();
    let error: serde_json::Value = response.json();
    assert_eq!(error["error"]["code"], "promotion_requirements_not_met");
    let unmet = error["error"]["details"]["unmet"].as_array().unwrap();
    assert!(unmet.iter().any(|u| u.as_str().unwrap().contains("XP")));
}

#[tokio::test]
async fn rank_history_tracks_every_promotion() {
    let harness = TestHarness::new();
    seed_economy(&harness, 700, 300, 1, 3, 70);

    for _ in 0..2 {
        harness
            .server
            .post("/v1/ranks/promote")
            .add_header("authorization", harness.user_auth_header())
            .await
            .assert_status_ok();
    }

    let response = harness
        .server
        .get("/v1/ranks/me")
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["rank"], "holcatte");
    assert_eq!(body["multiplier"], 1.25);

    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["rank"], "batab");
    assert_eq!(history[1]["rank"], "holcatte");
}

#[tokio::test]
async fn promotion_stops_at_the_top_of_the_ladder() {
    let harness = TestHarness::new();
    seed_economy(&harness, 100_000, 50_000, 50, 20, 95);

    for expected in ["batab", "holcatte", "guerrero", "mercenario"] {
        let response = harness
            .server
            .post("/v1/ranks/promote")
            .add_header("authorization", harness.user_auth_header())
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["record"]["rank"], expected);
    }

    let response = harness
        .server
        .post("/v1/ranks/promote")
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_bad_request();
    let error: serde_json::Value = response.json();
    assert_eq!(error["error"]["code"], "max_rank_reached");
}

#[tokio::test]
async fn service_can_read_any_users_rank() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get(&format!("/v1/ranks/user/{}", harness.test_user_id))
        .add_header("x-api-key", harness.service_api_key.as_str())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["rank"], "nacom");
}
