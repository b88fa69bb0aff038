//! Rewards HTTP client implementation.

use reqwest::Client;
use std::time::Duration;

use ml_rewards_core::{ActionType, UserId};

use crate::error::ClientError;
use crate::types::{
    ActionReport, ActionReportResponse, ApiErrorResponse, BalanceResponse, RankResponse,
    SubmissionRequest, SubmissionResponse, UnlockAchievementRequest, UnlockAchievementResponse,
};

/// Rewards API client.
///
/// Provides methods for settling exercise submissions, reporting learner
/// actions, and reading progression state.
#[derive(Debug, Clone)]
pub struct MlRewardsClient {
    client: Client,
    base_url: String,
    api_key: String,
    service_name: String,
}

impl MlRewardsClient {
    /// Create a new rewards client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the rewards service (e.g., `"http://ml-rewards:8080"`)
    /// * `api_key` - Service API key for authentication
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_options(base_url, api_key, ClientOptions::default())
    }

    /// Create a new rewards client with custom options.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with default settings).
    #[must_use]
    pub fn with_options(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        options: ClientOptions,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            service_name: options.service_name,
        }
    }

    /// Submit a graded exercise attempt for settlement.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::DuplicateSubmission`] when the submission ID was
    /// already settled and [`ClientError::RateLimited`] when the learner
    /// resubmitted the same exercise too quickly.
    pub async fn submit_exercise(
        &self,
        request: SubmissionRequest,
    ) -> Result<SubmissionResponse, ClientError> {
        let url = format!(
            "{}/v1/exercises/{}/submit",
            self.base_url, request.exercise.id
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .json(&request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Report a learner action for mission, achievement, and rank progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn report_action(
        &self,
        report: ActionReport,
    ) -> Result<ActionReportResponse, ClientError> {
        let url = format!("{}/v1/missions/check", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .json(&report)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Report a daily login.
    ///
    /// This is a convenience method over [`Self::report_action`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn report_login(&self, user_id: UserId) -> Result<ActionReportResponse, ClientError> {
        self.report_action(ActionReport {
            user_id,
            action_type: ActionType::DailyLogin,
            amount: 1,
        })
        .await
    }

    /// Report completed course modules.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn report_modules_completed(
        &self,
        user_id: UserId,
        count: i64,
    ) -> Result<ActionReportResponse, ClientError> {
        self.report_action(ActionReport {
            user_id,
            action_type: ActionType::CompleteModules,
            amount: count,
        })
        .await
    }

    /// Get a learner's rank standing.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn get_user_rank(&self, user_id: UserId) -> Result<RankResponse, ClientError> {
        let url = format!("{}/v1/ranks/user/{user_id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Grant an achievement directly.
    ///
    /// # Errors
    ///
    /// Returns an error if the achievement is unknown or already held.
    pub async fn unlock_achievement(
        &self,
        user_id: UserId,
        achievement_id: impl Into<String>,
    ) -> Result<UnlockAchievementResponse, ClientError> {
        let url = format!("{}/v1/achievements/unlock", self.base_url);
        let request = UnlockAchievementRequest {
            user_id,
            achievement_id: achievement_id.into(),
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .json(&request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a learner's coin balance (requires user JWT, not service API key).
    ///
    /// This method is typically used by the learner-facing dashboard, not by services.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn get_balance(&self, user_jwt: &str) -> Result<BalanceResponse, ClientError> {
        let url = format!("{}/v1/coins/balance", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("authorization", format!("Bearer {user_jwt}"))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Try to parse error response
        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => {
                let code = api_error.error.code.as_str();
                let message = api_error.error.message;
                let detail = |key: &str| -> Option<i64> {
                    api_error
                        .error
                        .details
                        .as_ref()
                        .and_then(|d| d.get(key))
                        .and_then(serde_json::Value::as_i64)
                };

                // Map specific error codes to typed errors
                match code {
                    "insufficient_funds" => Err(ClientError::InsufficientFunds {
                        balance: detail("balance").unwrap_or(0),
                        required: detail("required").unwrap_or(0),
                    }),
                    "rate_limited" => Err(ClientError::RateLimited {
                        retry_after: detail("retry_after")
                            .and_then(|s| u64::try_from(s).ok())
                            .unwrap_or(1),
                    }),
                    "duplicate_submission" => Err(ClientError::DuplicateSubmission {
                        submission_id: message.replace("duplicate submission: ", ""),
                    }),
                    _ => Err(ClientError::Api {
                        code: code.to_string(),
                        message,
                        status: status.as_u16(),
                    }),
                }
            }
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// Service name to include in requests.
    pub service_name: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            service_name: "unknown".to_string(),
        }
    }
}

impl ClientOptions {
    /// Create options with a service name.
    #[must_use]
    pub fn with_service_name(name: impl Into<String>) -> Self {
        Self {
            service_name: name.into(),
            ..Self::default()
        }
    }
}
