//! `RocksDB` storage layer for the ML rewards engine.
//!
//! This crate persists economy state, the coin ledger, ranks, missions,
//! achievement unlocks, and submission receipts using `RocksDB` with column
//! families for indexing.
//!
//! # Architecture
//!
//! - `economy`: per-user balance/XP/streak/stats, keyed by `user_id`
//! - `transactions` + `transactions_by_user`: the append-only coin ledger
//! - `rank_current` + `rank_history`: promotion records
//! - `missions` + `missions_by_user`: mission instances
//! - `unlocks`: achievement unlock records
//! - `submissions` + `submission_latest`: settled submission receipts
//! - `activity`: last qualifying activity per user
//!
//! Compound operations (settling a submission, claiming a mission,
//! promoting, unlocking) read, validate, and write under one internal
//! write lock and land in a single `WriteBatch`, so ledger rows and the
//! balances they record can never disagree.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ml_rewards_core::{
    AchievementDef, ActionType, CoinTransaction, EconomyState, ExerciseId, LearningStats, Mission,
    MissionId, MissionType, RankRecord, StreakChange, TransactionDraft, TransactionId,
    UserAchievement, UserId,
};

/// The durable record of one settled submission, kept for idempotency
/// and audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// Client-supplied submission id.
    pub submission_id: String,
    /// The learner.
    pub user_id: UserId,
    /// The exercise submitted.
    pub exercise_id: ExerciseId,
    /// Raw score from the scorer.
    pub raw_score: f64,
    /// Final score after multipliers, bonuses, and penalties.
    pub final_score: u8,
    /// When the submission settled.
    pub settled_at: DateTime<Utc>,
}

/// Increments to fold into a learner's [`LearningStats`].
#[derive(Debug, Clone, Default)]
pub struct StatsDelta {
    /// Exercises completed.
    pub exercises_completed: u64,
    /// Perfect raw scores.
    pub perfect_scores: u64,
    /// First-attempt passes.
    pub first_attempt_passes: u64,
    /// Modules completed.
    pub modules_completed: u64,
    /// A final score to fold into the rolling average, if any.
    pub score: Option<u8>,
}

impl StatsDelta {
    /// Apply the increments.
    pub fn apply_to(&self, stats: &mut LearningStats) {
        stats.exercises_completed += self.exercises_completed;
        stats.perfect_scores += self.perfect_scores;
        stats.first_attempt_passes += self.first_attempt_passes;
        stats.modules_completed += self.modules_completed;
        if let Some(score) = self.score {
            stats.score_sum += u64::from(score);
            stats.score_count += 1;
        }
    }
}

/// Everything [`Store::settle_submission`] writes atomically.
#[derive(Debug, Clone)]
pub struct Settlement {
    /// The receipt recorded for idempotency.
    pub receipt: SubmissionReceipt,
    /// The coin credit. Skipped (no ledger row) when its amount is zero.
    pub draft: TransactionDraft,
    /// XP to credit.
    pub xp: i64,
    /// Stat increments.
    pub stats: StatsDelta,
}

/// Result of settling a submission.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    /// The economy state after the settle.
    pub state: EconomyState,
    /// The ledger row, when coins were credited.
    pub transaction: Option<CoinTransaction>,
    /// What the settle did to the streak.
    pub streak: StreakChange,
}

/// Result of a plain credit or debit.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    /// The economy state after the change.
    pub state: EconomyState,
    /// The ledger row.
    pub transaction: CoinTransaction,
}

/// Result of claiming a completed mission.
#[derive(Debug, Clone)]
pub struct ClaimOutcome {
    /// The mission, now claimed.
    pub mission: Mission,
    /// The economy state after crediting the rewards.
    pub state: EconomyState,
    /// The ledger row, when the mission paid coins.
    pub transaction: Option<CoinTransaction>,
}

/// Result of a promotion.
#[derive(Debug, Clone)]
pub struct PromotionOutcome {
    /// The new current rank record.
    pub record: RankRecord,
    /// The economy state after the signing bonus.
    pub state: EconomyState,
    /// The bonus ledger row, when the tier pays one.
    pub transaction: Option<CoinTransaction>,
}

/// Result of unlocking an achievement.
#[derive(Debug, Clone)]
pub struct UnlockOutcome {
    /// The unlock record.
    pub unlock: UserAchievement,
    /// The economy state after crediting the rewards.
    pub state: EconomyState,
    /// The ledger row, when the achievement paid coins.
    pub transaction: Option<CoinTransaction>,
}

/// The storage trait defining all database operations.
///
/// Abstracts the storage layer so handlers and the engine can be tested
/// against alternative implementations.
pub trait Store: Send + Sync {
    // =========================================================================
    // Economy Operations
    // =========================================================================

    /// Insert or overwrite an economy record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_economy(&self, state: &EconomyState) -> Result<()>;

    /// Get a learner's economy record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_economy(&self, user_id: &UserId) -> Result<Option<EconomyState>>;

    /// Credit coins (and optionally XP), recording a ledger row atomically.
    ///
    /// Creates the economy record lazily if the learner has none yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn credit(&self, draft: &TransactionDraft, xp: i64) -> Result<LedgerEntry>;

    /// Debit coins, recording a ledger row atomically.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InsufficientFunds` if the balance does not
    /// cover the debit; no ledger row is written in that case.
    fn debit(&self, draft: &TransactionDraft) -> Result<LedgerEntry>;

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Get a transaction by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<CoinTransaction>>;

    /// List a learner's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CoinTransaction>>;

    // =========================================================================
    // Submission Operations
    // =========================================================================

    /// Settle a submission: record the receipt, advance the streak, credit
    /// coins and XP, and fold in stat increments, all atomically.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateSubmission` if the submission id was
    /// already settled; nothing is written in that case.
    fn settle_submission(&self, settlement: &Settlement) -> Result<SettlementOutcome>;

    /// Whether a submission id has already settled.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn has_submission(&self, submission_id: &str) -> Result<bool>;

    /// When the learner last submitted this exercise, if ever.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn last_submission_at(
        &self,
        user_id: &UserId,
        exercise_id: &ExerciseId,
    ) -> Result<Option<DateTime<Utc>>>;

    // =========================================================================
    // Activity Operations
    // =========================================================================

    /// Record a qualifying activity (login, submission, claim).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn log_activity(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<()>;

    /// All users with activity at or after `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn active_users_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<UserId>>;

    // =========================================================================
    // Rank Operations
    // =========================================================================

    /// The learner's current rank record, if any was ever written.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn current_rank(&self, user_id: &UserId) -> Result<Option<RankRecord>>;

    /// The learner's full promotion history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn rank_history(&self, user_id: &UserId) -> Result<Vec<RankRecord>>;

    /// Promote a learner: replace the current rank record, append to the
    /// history, and credit the signing bonus, all atomically.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RankConflict` if the stored current rank does
    /// not match the record's `previous_rank` (a concurrent promotion won).
    fn promote(&self, record: &RankRecord) -> Result<PromotionOutcome>;

    // =========================================================================
    // Mission Operations
    // =========================================================================

    /// Insert mission instances, maintaining the user index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_missions(&self, missions: &[Mission]) -> Result<()>;

    /// Insert a sampled mission set for one period, unless the learner
    /// already has missions of that cadence starting inside
    /// `[start, end)`. The period check and the insert run under the
    /// write lock, so concurrent callers cannot both seed the period;
    /// the set that actually landed is returned either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_missions_if_absent(
        &self,
        user_id: &UserId,
        mission_type: MissionType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        missions: &[Mission],
    ) -> Result<Vec<Mission>>;

    /// Get a mission by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_mission(&self, mission_id: &MissionId) -> Result<Option<Mission>>;

    /// All of a learner's mission instances, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_missions_by_user(&self, user_id: &UserId) -> Result<Vec<Mission>>;

    /// Apply an action to every matching objective of the learner's
    /// progressable missions. Missions whose window already closed are
    /// expired instead of progressed.
    ///
    /// Returns the missions this call completed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn apply_mission_action(
        &self,
        user_id: &UserId,
        action: ActionType,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Mission>>;

    /// Claim a completed mission's rewards atomically.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the mission does not exist or belongs
    ///   to another user.
    /// - `StoreError::MissionNotCompleted` if it is not completed yet.
    /// - `StoreError::AlreadyClaimed` if it was claimed before.
    fn claim_mission(
        &self,
        user_id: &UserId,
        mission_id: &MissionId,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome>;

    /// Expire every active/in-progress mission whose window has closed.
    ///
    /// Returns how many missions were expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn sweep_expired_missions(&self, now: DateTime<Utc>) -> Result<u64>;

    /// Delete finished (expired or claimed) missions whose window ended
    /// before `cutoff`.
    ///
    /// Returns how many missions were deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn purge_missions_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    // =========================================================================
    // Achievement Operations
    // =========================================================================

    /// Unlock an achievement and credit its rewards atomically.
    ///
    /// Idempotent: returns `Ok(None)` if the learner already holds it,
    /// without writing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn unlock_achievement(
        &self,
        user_id: &UserId,
        def: &AchievementDef,
        now: DateTime<Utc>,
    ) -> Result<Option<UnlockOutcome>>;

    /// All achievements the learner has unlocked.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_unlocks(&self, user_id: &UserId) -> Result<Vec<UserAchievement>>;
}
