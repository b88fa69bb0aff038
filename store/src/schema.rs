//! Column family definitions.

/// Column family names.
pub mod cf {
    /// Per-user economy state, keyed by `user_id`.
    pub const ECONOMY: &str = "economy";

    /// Ledger transactions, keyed by `transaction_id` (ULID).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index for listing transactions by user: `user_id || transaction_id`.
    pub const TRANSACTIONS_BY_USER: &str = "transactions_by_user";

    /// Current rank record per user, keyed by `user_id`.
    pub const RANK_CURRENT: &str = "rank_current";

    /// Full promotion history: `user_id || achieved_at_millis`.
    pub const RANK_HISTORY: &str = "rank_history";

    /// Mission instances, keyed by `mission_id` (ULID).
    pub const MISSIONS: &str = "missions";

    /// Index for listing missions by user: `user_id || mission_id`.
    pub const MISSIONS_BY_USER: &str = "missions_by_user";

    /// Achievement unlocks: `user_id || achievement_slug`.
    pub const UNLOCKS: &str = "unlocks";

    /// Settled submission receipts, keyed by `submission_id`.
    pub const SUBMISSIONS: &str = "submissions";

    /// Last submission timestamp, keyed by `user_id || exercise_id`.
    pub const SUBMISSION_LATEST: &str = "submission_latest";

    /// Last qualifying activity per user, keyed by `user_id`.
    pub const ACTIVITY: &str = "activity";
}

/// All column families that must exist in the database.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ECONOMY,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_USER,
        cf::RANK_CURRENT,
        cf::RANK_HISTORY,
        cf::MISSIONS,
        cf::MISSIONS_BY_USER,
        cf::UNLOCKS,
        cf::SUBMISSIONS,
        cf::SUBMISSION_LATEST,
        cf::ACTIVITY,
    ]
}
