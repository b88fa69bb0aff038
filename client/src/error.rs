//! Client error types.

/// Errors that can occur when using the rewards client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// Insufficient coin balance.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// Submission already processed.
    #[error("duplicate submission: {submission_id}")]
    DuplicateSubmission {
        /// The submission ID.
        submission_id: String,
    },

    /// Submission was throttled; retry later.
    #[error("rate limited, retry after {retry_after}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after: u64,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
