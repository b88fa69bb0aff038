//! Common test utilities for ml-rewards integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::json;
use tempfile::TempDir;

use ml_rewards_core::{ExerciseId, UserId};
use ml_rewards_service::{create_router, AppState, ServiceConfig};
use ml_rewards_store::RocksStore;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct store handle for seeding and inspecting state.
    pub store: Arc<RocksStore>,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
    /// The service API key for service-to-service requests.
    pub service_api_key: String,
    /// The admin API key for privileged requests.
    pub admin_api_key: String,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));

        let service_api_key = "test-service-key".to_string();
        let admin_api_key = "test-admin-key".to_string();

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            auth_base_url: "http://localhost".into(),
            auth_audience: "ml-rewards".into(),
            allow_test_tokens: true,
            service_api_key: Some(service_api_key.clone()),
            admin_api_key: Some(admin_api_key.clone()),
            ..ServiceConfig::default()
        };

        let state = AppState::new(config, Arc::clone(&store));
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_user_id = UserId::generate();

        Self {
            server,
            store,
            _temp_dir: temp_dir,
            test_user_id,
            service_api_key,
            admin_api_key,
        }
    }

    /// Get the authorization header for user authentication.
    pub fn user_auth_header(&self) -> String {
        format!("Bearer test-token:{}", self.test_user_id)
    }

    /// Get a different user's auth header (for testing isolation).
    pub fn other_user_auth_header() -> String {
        let other_user = UserId::generate();
        format!("Bearer test-token:{other_user}")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// A three-question multiple-choice exercise snapshot.
pub fn multiple_choice_exercise(id: &ExerciseId, difficulty: &str) -> serde_json::Value {
    json!({
        "id": id.to_string(),
        "difficulty": difficulty,
        "coin_reward": 10,
        "xp_reward": 40,
        "estimated_seconds": 240,
        "content": {
            "type": "multiple_choice",
            "questions": [
                { "id": "q1", "correct": "a" },
                { "id": "q2", "correct": "b" },
                { "id": "q3", "correct": "c" },
            ]
        }
    })
}

/// Answers scoring `correct` out of 3 on [`multiple_choice_exercise`].
pub fn multiple_choice_answers(correct: usize) -> serde_json::Value {
    let options = [("q1", "a"), ("q2", "b"), ("q3", "c")];
    let answers: serde_json::Map<String, serde_json::Value> = options
        .iter()
        .enumerate()
        .map(|(i, (q, right))| {
            let given = if i < correct { (*right).to_string() } else { "wrong".to_string() };
            ((*q).to_string(), serde_json::Value::String(given))
        })
        .collect();

    json!({ "type": "multiple_choice", "answers": answers })
}
