//! Client integration tests against a mock rewards API.

use std::collections::HashMap;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ml_rewards_client::{ActionReport, ClientError, ClientOptions, MlRewardsClient, SubmissionRequest};
use ml_rewards_core::exercise::ChoiceQuestion;
use ml_rewards_core::{
    ActionType, Difficulty, Exercise, ExerciseContent, ExerciseId, SubmissionMeta,
    SubmittedAnswers, UserId,
};

fn test_client(server: &MockServer) -> MlRewardsClient {
    MlRewardsClient::with_options(
        server.uri(),
        "test-api-key",
        ClientOptions::with_service_name("course-runner"),
    )
}

fn test_submission(user_id: UserId, exercise_id: ExerciseId) -> SubmissionRequest {
    SubmissionRequest {
        user_id,
        submission_id: "sub-1".to_string(),
        exercise: Exercise {
            id: exercise_id,
            difficulty: Difficulty::Easy,
            coin_reward: 10,
            xp_reward: 40,
            passing_score: 60,
            estimated_seconds: Some(240),
            content: ExerciseContent::MultipleChoice {
                questions: vec![ChoiceQuestion {
                    id: "q1".to_string(),
                    correct: "a".to_string(),
                }],
            },
        },
        answers: SubmittedAnswers::MultipleChoice {
            answers: HashMap::from([("q1".to_string(), "a".to_string())]),
        },
        meta: SubmissionMeta {
            time_spent_seconds: 120,
            powerups_used: 0,
            attempt: 1,
        },
    }
}

#[tokio::test]
async fn submit_exercise_parses_the_settlement() {
    let server = MockServer::start().await;
    let user_id = UserId::generate();
    let exercise_id = ExerciseId::generate();

    Mock::given(method("POST"))
        .and(path(format!("/v1/exercises/{exercise_id}/submit")))
        .and(header("x-api-key", "test-api-key"))
        .and(header("x-service-name", "course-runner"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "submission_id": "sub-1",
            "needs_review": false,
            "raw_score": 100.0,
            "final_score": 100,
            "passed": true,
            "coins": 10,
            "xp": 40,
            "bonuses": ["perfect_score", "first_attempt"],
            "penalty": 0,
            "multiplier": 1.0,
            "streak": "started",
            "current_streak": 1,
            "balance": 10,
            "total_xp": 40,
            "completed_missions": [],
            "unlocked_achievements": ["first_steps"],
            "promotions": [],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let outcome = client
        .submit_exercise(test_submission(user_id, exercise_id))
        .await
        .unwrap();

    assert_eq!(outcome.final_score, 100);
    assert!(outcome.passed);
    assert_eq!(outcome.balance, 10);
    assert_eq!(outcome.unlocked_achievements, vec!["first_steps"]);
}

#[tokio::test]
async fn duplicate_submission_maps_to_a_typed_error() {
    let server = MockServer::start().await;
    let user_id = UserId::generate();
    let exercise_id = ExerciseId::generate();

    Mock::given(method("POST"))
        .and(path(format!("/v1/exercises/{exercise_id}/submit")))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {
                "code": "duplicate_submission",
                "message": "duplicate submission: sub-1",
            }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let error = client
        .submit_exercise(test_submission(user_id, exercise_id))
        .await
        .unwrap_err();

    match error {
        ClientError::DuplicateSubmission { submission_id } => {
            assert_eq!(submission_id, "sub-1");
        }
        other => panic!("expected DuplicateSubmission, got {other:?}"),
    }
}

#[tokio::test]
async fn rate_limit_carries_the_retry_hint() {
    let server = MockServer::start().await;
    let user_id = UserId::generate();
    let exercise_id = ExerciseId::generate();

    Mock::given(method("POST"))
        .and(path(format!("/v1/exercises/{exercise_id}/submit")))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {
                "code": "rate_limited",
                "message": "Too many submissions",
                "details": { "retry_after": 4 },
            }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let error = client
        .submit_exercise(test_submission(user_id, exercise_id))
        .await
        .unwrap_err();

    match error {
        ClientError::RateLimited { retry_after } => assert_eq!(retry_after, 4),
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn action_reports_post_the_expected_body() {
    let server = MockServer::start().await;
    let user_id = UserId::generate();

    let expected = json!({
        "user_id": user_id.to_string(),
        "action_type": "earn_coins",
        "amount": 25,
    });
    Mock::given(method("POST"))
        .and(path("/v1/missions/check"))
        .and(header("x-api-key", "test-api-key"))
        .and(body_json(&expected))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "completed_missions": ["01ARZ3NDEKTSV4RRFFQ69G5FAV"],
            "unlocked_achievements": [],
            "promotions": [],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let response = client
        .report_action(ActionReport {
            user_id,
            action_type: ActionType::EarnCoins,
            amount: 25,
        })
        .await
        .unwrap();

    assert_eq!(response.completed_missions.len(), 1);
    assert!(response.promotions.is_empty());
}

#[tokio::test]
async fn get_user_rank_reads_the_standing() {
    let server = MockServer::start().await;
    let user_id = UserId::generate();

    Mock::given(method("GET"))
        .and(path(format!("/v1/ranks/user/{user_id}")))
        .and(header("x-api-key", "test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": user_id.to_string(),
            "rank": "batab",
            "multiplier": 1.1,
            "next_rank": "holcatte",
            "eligible": false,
            "unmet": ["600 XP (have 300)"],
            "history": [{
                "rank": "batab",
                "previous_rank": "nacom",
                "achieved_at": "2026-08-01T12:00:00+00:00",
                "bonus_coins": 50,
            }],
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let rank = client.get_user_rank(user_id).await.unwrap();

    assert_eq!(rank.rank, "batab");
    assert_eq!(rank.history.len(), 1);
    assert_eq!(rank.history[0].bonus_coins, 50);
}

#[tokio::test]
async fn get_balance_sends_the_user_jwt() {
    let server = MockServer::start().await;
    let user_id = UserId::generate();

    Mock::given(method("GET"))
        .and(path("/v1/coins/balance"))
        .and(header("authorization", "Bearer user-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": user_id.to_string(),
            "balance": 120,
            "earned_total": 150,
            "spent_total": 30,
            "earned_today": 20,
            "total_xp": 400,
            "current_streak": 3,
            "best_streak": 7,
            "rank": "nacom",
            "rank_multiplier": 1.0,
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let balance = client.get_balance("user-jwt").await.unwrap();

    assert_eq!(balance.balance, 120);
    assert_eq!(balance.current_streak, 3);
}

#[tokio::test]
async fn unparseable_errors_fall_back_to_the_status() {
    let server = MockServer::start().await;
    let user_id = UserId::generate();

    Mock::given(method("GET"))
        .and(path(format!("/v1/ranks/user/{user_id}")))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let error = client.get_user_rank(user_id).await.unwrap_err();

    match error {
        ClientError::Api { code, status, .. } => {
            assert_eq!(code, "unknown");
            assert_eq!(status, 500);
        }
        other => panic!("expected Api, got {other:?}"),
    }
}
