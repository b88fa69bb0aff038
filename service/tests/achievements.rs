//! Achievement catalog and unlock integration tests.

mod common;

use common::TestHarness;
use ml_rewards_core::EngineCatalog;
use serde_json::json;

#[tokio::test]
async fn catalog_lists_everything_locked_for_a_fresh_user() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/achievements")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let achievements = body["achievements"].as_array().unwrap();
    assert_eq!(achievements.len(), EngineCatalog::default().achievements.len());
    for achievement in achievements {
        assert_eq!(achievement["unlocked"], false);
        assert!(achievement["unlocked_at"].is_null());
    }
}

#[tokio::test]
async fn service_grant_unlocks_once_and_pays_rewards() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/achievements/unlock")
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "achievement_id": "first_steps",
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["achievement_id"], "first_steps");
    let expected_coins = EngineCatalog::default()
        .achievement("first_steps")
        .unwrap()
        .rewards
        .coins;
    assert_eq!(body["balance"], expected_coins);

    // A second grant conflicts instead of double-paying.
    let again = harness
        .server
        .post("/v1/achievements/unlock")
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "achievement_id": "first_steps",
        }))
        .await;
    again.assert_status(axum::http::StatusCode::CONFLICT);
    let error: serde_json::Value = again.json();
    assert_eq!(error["error"]["code"], "achievement_already_unlocked");

    // The catalog now shows it as held.
    let list = harness
        .server
        .get("/v1/achievements")
        .add_header("authorization", harness.user_auth_header())
        .await;
    list.assert_status_ok();
    let list: serde_json::Value = list.json();
    let held = list["achievements"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"] == "first_steps")
        .unwrap();
    assert_eq!(held["unlocked"], true);
    assert!(held["unlocked_at"].is_string());
}

#[tokio::test]
async fn unknown_achievement_is_not_found() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/achievements/unlock")
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "achievement_id": "does_not_exist",
        }))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn submissions_unlock_stat_achievements_automatically() {
    let harness = TestHarness::new();
    let exercise_id = ml_rewards_core::ExerciseId::generate();

    let response = harness
        .server
        .post(&format!("/v1/exercises/{exercise_id}/submit"))
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "submission_id": "sub-achieve-1",
            "exercise": common::multiple_choice_exercise(&exercise_id, "easy"),
            "answers": common::multiple_choice_answers(3),
            "meta": { "time_spent_seconds": 120, "powerups_used": 0, "attempt": 1 },
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    // One settled exercise is enough for the first milestone.
    assert!(body["unlocked_achievements"]
        .as_array()
        .unwrap()
        .iter()
        .any(|a| a == "first_steps"));
}
