//! Request and response types for the rewards client.

use serde::{Deserialize, Serialize};

use ml_rewards_core::{
    ActionType, BonusKind, Exercise, StreakChange, SubmissionMeta, SubmittedAnswers, UserId,
};

/// A graded exercise attempt to settle.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionRequest {
    /// The learner who submitted.
    pub user_id: UserId,
    /// Unique submission ID for idempotency.
    pub submission_id: String,
    /// Snapshot of the exercise being graded.
    pub exercise: Exercise,
    /// The submitted answers.
    pub answers: SubmittedAnswers,
    /// Timing/attempt metadata.
    pub meta: SubmissionMeta,
}

/// Settlement outcome for a submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionResponse {
    /// Echo of the idempotency key.
    pub submission_id: String,
    /// True when the exercise routes to manual grading.
    pub needs_review: bool,
    /// Raw score before multipliers.
    pub raw_score: f64,
    /// Final score after multipliers, bonuses, and penalties.
    pub final_score: u8,
    /// Whether the final score met the passing threshold.
    pub passed: bool,
    /// Coins credited.
    pub coins: i64,
    /// XP credited.
    pub xp: i64,
    /// Bonus rules that fired.
    pub bonuses: Vec<BonusKind>,
    /// Points subtracted for power-up usage.
    pub penalty: i64,
    /// Combined multiplier.
    pub multiplier: f64,
    /// What the settle did to the streak, absent for review routes.
    pub streak: Option<StreakChange>,
    /// Streak length after the settle.
    pub current_streak: u32,
    /// Coin balance after the settle.
    pub balance: i64,
    /// Lifetime XP after the settle.
    pub total_xp: i64,
    /// Mission ids this submission completed.
    pub completed_missions: Vec<String>,
    /// Achievement slugs this submission unlocked.
    pub unlocked_achievements: Vec<String>,
    /// Ranks this submission promoted the learner into.
    pub promotions: Vec<String>,
}

/// An externally observed learner action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionReport {
    /// The learner the action belongs to.
    pub user_id: UserId,
    /// The action performed.
    pub action_type: ActionType,
    /// How much of it (count or absolute level).
    pub amount: i64,
}

/// What an action report knocked loose.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionReportResponse {
    /// Mission ids the report completed.
    pub completed_missions: Vec<String>,
    /// Achievement slugs the report unlocked.
    pub unlocked_achievements: Vec<String>,
    /// Ranks the report promoted the learner into.
    pub promotions: Vec<String>,
}

/// A single promotion in the rank history.
#[derive(Debug, Clone, Deserialize)]
pub struct RankRecordResponse {
    /// Rank name.
    pub rank: String,
    /// Rank held before this one, if any.
    pub previous_rank: Option<String>,
    /// When the rank was achieved (RFC 3339).
    pub achieved_at: String,
    /// Signing bonus credited on promotion.
    pub bonus_coins: i64,
}

/// A learner's rank standing.
#[derive(Debug, Clone, Deserialize)]
pub struct RankResponse {
    /// User ID.
    pub user_id: String,
    /// Current rank name.
    pub rank: String,
    /// Current rank multiplier.
    pub multiplier: f64,
    /// The next rank on the ladder, if any.
    pub next_rank: Option<String>,
    /// Whether a promotion would succeed right now.
    pub eligible: bool,
    /// Unmet requirements for the next rank.
    pub unmet: Vec<String>,
    /// Promotion history, oldest first.
    pub history: Vec<RankRecordResponse>,
}

/// Direct achievement grant request.
#[derive(Debug, Clone, Serialize)]
pub struct UnlockAchievementRequest {
    /// The learner to grant the achievement to.
    pub user_id: UserId,
    /// The achievement slug.
    pub achievement_id: String,
}

/// Achievement grant response.
#[derive(Debug, Clone, Deserialize)]
pub struct UnlockAchievementResponse {
    /// The achievement slug.
    pub achievement_id: String,
    /// When it was unlocked (RFC 3339).
    pub unlocked_at: String,
    /// Balance after the rewards.
    pub balance: i64,
}

/// Balance response.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    /// User ID.
    pub user_id: String,
    /// Spendable coin balance.
    pub balance: i64,
    /// Lifetime coins earned.
    pub earned_total: i64,
    /// Lifetime coins spent.
    pub spent_total: i64,
    /// Coins earned today (UTC).
    pub earned_today: i64,
    /// Lifetime XP.
    pub total_xp: i64,
    /// Current streak in days.
    pub current_streak: u32,
    /// Best streak ever held.
    pub best_streak: u32,
    /// Current rank name.
    pub rank: String,
    /// Current rank multiplier.
    pub rank_multiplier: f64,
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorBody,
}

/// API error body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
    /// Additional details.
    pub details: Option<serde_json::Value>,
}
