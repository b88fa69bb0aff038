//! Submission pipeline integration tests.

mod common;

use common::{multiple_choice_answers, multiple_choice_exercise, TestHarness};
use ml_rewards_core::ExerciseId;
use serde_json::json;

fn submit_body(
    harness: &TestHarness,
    submission_id: &str,
    exercise: &serde_json::Value,
    answers: serde_json::Value,
    meta: serde_json::Value,
) -> serde_json::Value {
    json!({
        "user_id": harness.test_user_id.to_string(),
        "submission_id": submission_id,
        "exercise": exercise,
        "answers": answers,
        "meta": meta,
    })
}

#[tokio::test]
async fn perfect_hard_run_pays_full_rewards() {
    let harness = TestHarness::new();
    let exercise_id = ExerciseId::generate();
    let exercise = multiple_choice_exercise(&exercise_id, "hard");

    let response = harness
        .server
        .post(&format!("/v1/exercises/{exercise_id}/submit"))
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&submit_body(
            &harness,
            "sub-perfect-1",
            &exercise,
            multiple_choice_answers(3),
            json!({ "time_spent_seconds": 120, "powerups_used": 0, "attempt": 1 }),
        ))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["final_score"], 100);
    assert_eq!(body["passed"], true);
    assert_eq!(body["needs_review"], false);
    // Full payout of the declared base rewards.
    assert_eq!(body["coins"], 10);
    assert_eq!(body["xp"], 40);
    assert_eq!(body["balance"], 10);
    assert_eq!(body["current_streak"], 1);
    assert_eq!(body["streak"], "started");

    let bonuses: Vec<String> = body["bonuses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b.as_str().unwrap().to_string())
        .collect();
    assert!(bonuses.contains(&"perfect_score".to_string()));
    assert!(bonuses.contains(&"speed_run".to_string()));
    assert!(bonuses.contains(&"first_attempt".to_string()));
}

#[tokio::test]
async fn powerups_cost_points_and_can_fail_the_pass() {
    let harness = TestHarness::new();
    let exercise_id = ExerciseId::generate();
    let mut exercise = multiple_choice_exercise(&exercise_id, "easy");
    // No speed bonus for this one.
    exercise["estimated_seconds"] = serde_json::Value::Null;

    // 2/3 correct ≈ 66.7 on easy, minus 10 for two power-ups.
    let response = harness
        .server
        .post(&format!("/v1/exercises/{exercise_id}/submit"))
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&submit_body(
            &harness,
            "sub-powerups-1",
            &exercise,
            multiple_choice_answers(2),
            json!({ "time_spent_seconds": 300, "powerups_used": 2, "attempt": 2 }),
        ))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["final_score"], 57);
    assert_eq!(body["penalty"], 10);
    assert_eq!(body["passed"], false);
    assert!(body["bonuses"].as_array().unwrap().is_empty());
    // Coins still scale with the final score.
    assert_eq!(body["coins"], 5);
}

#[tokio::test]
async fn duplicate_submission_id_conflicts() {
    let harness = TestHarness::new();
    let exercise_id = ExerciseId::generate();
    let exercise = multiple_choice_exercise(&exercise_id, "medium");

    let body = submit_body(
        &harness,
        "sub-replay-1",
        &exercise,
        multiple_choice_answers(3),
        json!({ "time_spent_seconds": 120, "powerups_used": 0, "attempt": 1 }),
    );

    harness
        .server
        .post(&format!("/v1/exercises/{exercise_id}/submit"))
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&body)
        .await
        .assert_status_ok();

    let replay = harness
        .server
        .post(&format!("/v1/exercises/{exercise_id}/submit"))
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&body)
        .await;

    replay.assert_status(axum::http::StatusCode::CONFLICT);
    let error: serde_json::Value = replay.json();
    assert_eq!(error["error"]["code"], "duplicate_submission");
}

#[tokio::test]
async fn rapid_resubmission_is_rate_limited() {
    let harness = TestHarness::new();
    let exercise_id = ExerciseId::generate();
    let exercise = multiple_choice_exercise(&exercise_id, "medium");

    harness
        .server
        .post(&format!("/v1/exercises/{exercise_id}/submit"))
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&submit_body(
            &harness,
            "sub-rate-1",
            &exercise,
            multiple_choice_answers(3),
            json!({ "time_spent_seconds": 120, "powerups_used": 0, "attempt": 1 }),
        ))
        .await
        .assert_status_ok();

    // Fresh submission id, same (user, exercise), inside the window.
    let second = harness
        .server
        .post(&format!("/v1/exercises/{exercise_id}/submit"))
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&submit_body(
            &harness,
            "sub-rate-2",
            &exercise,
            multiple_choice_answers(3),
            json!({ "time_spent_seconds": 120, "powerups_used": 0, "attempt": 2 }),
        ))
        .await;

    second.assert_status(axum::http::StatusCode::TOO_MANY_REQUESTS);
    let error: serde_json::Value = second.json();
    assert_eq!(error["error"]["code"], "rate_limited");
    assert!(error["error"]["details"]["retry_after"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn implausibly_fast_submission_is_rejected() {
    let harness = TestHarness::new();
    let exercise_id = ExerciseId::generate();
    let exercise = multiple_choice_exercise(&exercise_id, "easy");

    let response = harness
        .server
        .post(&format!("/v1/exercises/{exercise_id}/submit"))
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&submit_body(
            &harness,
            "sub-fast-1",
            &exercise,
            multiple_choice_answers(3),
            json!({ "time_spent_seconds": 0, "powerups_used": 0, "attempt": 1 }),
        ))
        .await;

    response.assert_status_bad_request();
    let error: serde_json::Value = response.json();
    assert_eq!(error["error"]["code"], "submission_too_fast");
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let harness = TestHarness::new();
    let exercise_id = ExerciseId::generate();
    let exercise = multiple_choice_exercise(&exercise_id, "easy");

    let response = harness
        .server
        .post(&format!("/v1/exercises/{exercise_id}/submit"))
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&submit_body(
            &harness,
            "sub-expired-1",
            &exercise,
            multiple_choice_answers(3),
            json!({ "time_spent_seconds": 200_000, "powerups_used": 0, "attempt": 1 }),
        ))
        .await;

    response.assert_status_bad_request();
    let error: serde_json::Value = response.json();
    assert_eq!(error["error"]["code"], "session_expired");
}

#[tokio::test]
async fn project_submission_routes_to_review_without_credit() {
    let harness = TestHarness::new();
    let exercise_id = ExerciseId::generate();
    let exercise = json!({
        "id": exercise_id.to_string(),
        "difficulty": "hard",
        "content": { "type": "project" }
    });

    let response = harness
        .server
        .post(&format!("/v1/exercises/{exercise_id}/submit"))
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&submit_body(
            &harness,
            "sub-review-1",
            &exercise,
            json!({ "type": "project" }),
            json!({ "time_spent_seconds": 3600, "powerups_used": 0, "attempt": 1 }),
        ))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["needs_review"], true);
    assert_eq!(body["coins"], 0);
    assert_eq!(body["xp"], 0);

    // Nothing settled, so the learner still has no economy record.
    let balance = harness
        .server
        .get("/v1/coins/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;
    balance.assert_status_ok();
    let balance: serde_json::Value = balance.json();
    assert_eq!(balance["balance"], 0);
    assert_eq!(balance["current_streak"], 0);
}

#[tokio::test]
async fn mismatched_answer_shape_is_a_validation_error() {
    let harness = TestHarness::new();
    let exercise_id = ExerciseId::generate();
    let exercise = multiple_choice_exercise(&exercise_id, "easy");

    let response = harness
        .server
        .post(&format!("/v1/exercises/{exercise_id}/submit"))
        .add_header("x-api-key", harness.service_api_key.as_str())
        .json(&submit_body(
            &harness,
            "sub-mismatch-1",
            &exercise,
            json!({ "type": "ordering", "order": ["a", "b"] }),
            json!({ "time_spent_seconds": 60, "powerups_used": 0, "attempt": 1 }),
        ))
        .await;

    response.assert_status_bad_request();
    let error: serde_json::Value = response.json();
    assert_eq!(error["error"]["code"], "validation_error");
}

#[tokio::test]
async fn submit_requires_service_key() {
    let harness = TestHarness::new();
    let exercise_id = ExerciseId::generate();
    let exercise = multiple_choice_exercise(&exercise_id, "easy");

    let response = harness
        .server
        .post(&format!("/v1/exercises/{exercise_id}/submit"))
        .json(&submit_body(
            &harness,
            "sub-noauth-1",
            &exercise,
            multiple_choice_answers(3),
            json!({ "time_spent_seconds": 120, "powerups_used": 0, "attempt": 1 }),
        ))
        .await;

    response.assert_status_unauthorized();
}
