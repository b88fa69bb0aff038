//! Mission generation, progress, and claim integration tests.

mod common;

use chrono::{Duration, Utc};
use common::TestHarness;
use ml_rewards_core::{
    Mission, MissionTemplate, MissionType, ObjectiveSpec, RewardBundle,
};
use ml_rewards_store::Store;
use serde_json::json;

/// Seed a single-objective daily mission for the harness user.
fn seed_mission(harness: &TestHarness, action: &str, target: i64, coins: i64) -> Mission {
    let template = MissionTemplate {
        id: "test_mission".into(),
        mission_type: MissionType::Daily,
        title: "Test mission".into(),
        description: "Seeded by the test".into(),
        objectives: vec![ObjectiveSpec {
            action: serde_json::from_value(json!(action)).unwrap(),
            target,
        }],
        rewards: RewardBundle {
            coins,
            xp: 50,
            items: Vec::new(),
        },
    };
    let now = Utc::now();
    let mission = Mission::instantiate(
        &template,
        harness.test_user_id,
        now - Duration::hours(1),
        now + Duration::hours(1),
    );
    harness.store.put_missions(std::slice::from_ref(&mission)).unwrap();
    mission
}

#[tokio::test]
async fn first_fetch_generates_the_daily_set() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/missions/daily")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let missions = body["missions"].as_array().unwrap();
    assert_eq!(missions.len(), 3);
    for mission in missions {
        assert_eq!(mission["mission_type"], "daily");
        assert_eq!(mission["status"], "active");
        assert_eq!(mission["progress"], 0.0);
    }

    // The second fetch returns the same set, not a fresh sample.
    let again = harness
        .server
        .get("/v1/missions/daily")
        .add_header("authorization", harness.user_auth_header())
        .await;
    again.assert_status_ok();
    let again: serde_json::Value = again.json();

    let ids = |v: &serde_json::Value| -> Vec<String> {
        let mut ids: Vec<String> = v["missions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_str().unwrap().to_string())
            .collect();
        ids.sort();
        ids
    };
    assert_eq!(ids(&body), ids(&again));
}

#[tokio::test]
async fn weekly_set_is_larger_than_daily() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/missions/weekly")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["missions"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn unknown_mission_type_is_rejected() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/missions/hourly")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn reported_actions_complete_and_claim_pays_out() {
    let harness = TestHarness::new();
    let mission = seed_mission(&harness, "earn_coins", 10, 25);

    // Partial progress first.
    let partial = harness
        .server
        .post("/v1/missions/check")
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "action_type": "earn_coins",
            "amount": 4,
        }))
        .await;
    partial.assert_status_ok();
    let body: serde_json::Value = partial.json();
    assert!(body["completed_missions"].as_array().unwrap().is_empty());

    // The final increment completes it.
    let done = harness
        .server
        .post("/v1/missions/check")
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "action_type": "earn_coins",
            "amount": 6,
        }))
        .await;
    done.assert_status_ok();
    let body: serde_json::Value = done.json();
    assert_eq!(
        body["completed_missions"],
        json!([mission.id.to_string()])
    );

    // Claim the rewards.
    let claim = harness
        .server
        .post(&format!("/v1/missions/{}/claim", mission.id))
        .add_header("authorization", harness.user_auth_header())
        .await;
    claim.assert_status_ok();
    let body: serde_json::Value = claim.json();
    assert_eq!(body["mission"]["status"], "claimed");
    assert_eq!(body["balance"], 25);
    assert_eq!(body["total_xp"], 50);
    assert_eq!(body["transaction"]["transaction_type"], "earned_mission");
}

#[tokio::test]
async fn claiming_twice_conflicts() {
    let harness = TestHarness::new();
    let mission = seed_mission(&harness, "complete_exercises", 1, 10);

    harness
        .server
        .post("/v1/missions/check")
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "action_type": "complete_exercises",
            "amount": 1,
        }))
        .await
        .assert_status_ok();

    harness
        .server
        .post(&format!("/v1/missions/{}/claim", mission.id))
        .add_header("authorization", harness.user_auth_header())
        .await
        .assert_status_ok();

    let again = harness
        .server
        .post(&format!("/v1/missions/{}/claim", mission.id))
        .add_header("authorization", harness.user_auth_header())
        .await;
    again.assert_status(axum::http::StatusCode::CONFLICT);
    let error: serde_json::Value = again.json();
    assert_eq!(error["error"]["code"], "mission_already_claimed");
}

#[tokio::test]
async fn unfinished_missions_cannot_be_claimed() {
    let harness = TestHarness::new();
    let mission = seed_mission(&harness, "perfect_scores", 3, 10);

    let response = harness
        .server
        .post(&format!("/v1/missions/{}/claim", mission.id))
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_bad_request();
    let error: serde_json::Value = response.json();
    assert_eq!(error["error"]["code"], "mission_not_completed");
}

#[tokio::test]
async fn claims_are_scoped_to_the_owner() {
    let harness = TestHarness::new();
    let mission = seed_mission(&harness, "complete_exercises", 1, 10);

    harness
        .server
        .post("/v1/missions/check")
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "action_type": "complete_exercises",
            "amount": 1,
        }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post(&format!("/v1/missions/{}/claim", mission.id))
        .add_header("authorization", TestHarness::other_user_auth_header())
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn module_completions_feed_rank_progress() {
    let harness = TestHarness::new();

    harness
        .server
        .post("/v1/missions/check")
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "action_type": "complete_modules",
            "amount": 2,
        }))
        .await
        .assert_status_ok();

    let economy = harness
        .store
        .get_economy(&harness.test_user_id)
        .unwrap()
        .unwrap();
    assert_eq!(economy.stats.modules_completed, 2);
}
