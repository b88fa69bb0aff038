//! Error types for rewards storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("not found")]
    NotFound,

    /// Balance too low for a debit.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current ML Coin balance.
        balance: i64,
        /// Amount the debit needed.
        required: i64,
    },

    /// Submission id already settled (idempotency check failed).
    #[error("duplicate submission: {submission_id}")]
    DuplicateSubmission {
        /// The submission id that was replayed.
        submission_id: String,
    },

    /// Mission rewards were already claimed.
    #[error("mission already claimed")]
    AlreadyClaimed,

    /// Mission is not in the completed state.
    #[error("mission not completed")]
    MissionNotCompleted,

    /// The stored current rank no longer matches the promotion's
    /// starting rank; a concurrent promotion won.
    #[error("rank changed concurrently")]
    RankConflict,
}
