//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Conflict - invalid state transition.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Submission arrived faster than a human plausibly could.
    #[error("submission too fast")]
    SubmissionTooFast,

    /// Claimed time exceeds the session lifetime.
    #[error("session expired")]
    SessionExpired,

    /// Per-(user, exercise) submission window not elapsed.
    #[error("rate limited, retry in {retry_after}s")]
    RateLimited {
        /// Seconds until the window reopens.
        retry_after: u64,
    },

    /// Submission id already settled.
    #[error("duplicate submission: {0}")]
    DuplicateSubmission(String),

    /// Balance too low for the spend.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// Promotion thresholds not all met.
    #[error("promotion requirements not met")]
    PromotionRequirementsNotMet {
        /// Human-readable shortfalls.
        unmet: Vec<String>,
    },

    /// Already at the top of the ladder.
    #[error("max rank reached")]
    MaxRankReached,

    /// Mission rewards cannot be claimed before completion.
    #[error("mission not completed")]
    MissionNotCompleted,

    /// Mission rewards were already claimed.
    #[error("mission already claimed")]
    MissionAlreadyClaimed,

    /// Achievement already held by the learner.
    #[error("achievement already unlocked")]
    AchievementAlreadyUnlocked,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// External service error.
    #[error("external service error: {0}")]
    ExternalService(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                msg.clone(),
                None,
            ),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::SubmissionTooFast => (
                StatusCode::BAD_REQUEST,
                "submission_too_fast",
                "Submission completed implausibly fast".to_string(),
                None,
            ),
            Self::SessionExpired => (
                StatusCode::BAD_REQUEST,
                "session_expired",
                "Session expired before submission".to_string(),
                None,
            ),
            Self::RateLimited { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                self.to_string(),
                Some(serde_json::json!({ "retry_after": retry_after })),
            ),
            Self::DuplicateSubmission(id) => (
                StatusCode::CONFLICT,
                "duplicate_submission",
                format!("Submission {id} already processed"),
                None,
            ),
            Self::InsufficientFunds { balance, required } => (
                StatusCode::BAD_REQUEST,
                "insufficient_funds",
                self.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::PromotionRequirementsNotMet { unmet } => (
                StatusCode::BAD_REQUEST,
                "promotion_requirements_not_met",
                "Promotion requirements not met".to_string(),
                Some(serde_json::json!({ "unmet": unmet })),
            ),
            Self::MaxRankReached => (
                StatusCode::BAD_REQUEST,
                "max_rank_reached",
                "Already at the highest rank".to_string(),
                None,
            ),
            Self::MissionNotCompleted => (
                StatusCode::BAD_REQUEST,
                "mission_not_completed",
                "Mission is not completed yet".to_string(),
                None,
            ),
            Self::MissionAlreadyClaimed => (
                StatusCode::CONFLICT,
                "mission_already_claimed",
                "Mission rewards already claimed".to_string(),
                None,
            ),
            Self::AchievementAlreadyUnlocked => (
                StatusCode::CONFLICT,
                "achievement_already_unlocked",
                "Achievement already unlocked".to_string(),
                None,
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            Self::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                "external_service_error",
                msg.clone(),
                None,
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ml_rewards_store::StoreError> for ApiError {
    fn from(err: ml_rewards_store::StoreError) -> Self {
        use ml_rewards_store::StoreError;
        match err {
            StoreError::NotFound => Self::NotFound("resource not found".into()),
            StoreError::InsufficientFunds { balance, required } => {
                Self::InsufficientFunds { balance, required }
            }
            StoreError::DuplicateSubmission { submission_id } => {
                Self::DuplicateSubmission(submission_id)
            }
            StoreError::AlreadyClaimed => Self::MissionAlreadyClaimed,
            StoreError::MissionNotCompleted => Self::MissionNotCompleted,
            StoreError::RankConflict => Self::Conflict("rank changed concurrently".into()),
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}
