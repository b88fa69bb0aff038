//! Core domain types for the ML rewards engine.
//!
//! This crate contains the pure, storage-agnostic half of the engine:
//!
//! - Identifiers ([`UserId`], [`ExerciseId`], [`TransactionId`], [`MissionId`])
//! - The per-user economy state and learning statistics
//! - ML Coin ledger transactions
//! - Exercise content, the scorer, and the reward calculator
//! - The rank ladder, streak arithmetic, missions, and achievements
//! - The immutable [`EngineCatalog`] injected at construction time
//!
//! Nothing in this crate performs I/O; everything is deterministic for
//! identical inputs, which keeps the reward pipeline reproducible and
//! safely retryable.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod achievement;
pub mod catalog;
pub mod economy;
pub mod exercise;
pub mod ids;
pub mod mission;
pub mod rank;
pub mod reward;
pub mod scoring;
pub mod streak;
pub mod transaction;

pub use achievement::{AchievementDef, Condition, PlayerStats, StatKey, UserAchievement};
pub use catalog::{EngineCatalog, RankTier};
pub use economy::{EconomyState, LearningStats};
pub use exercise::{Difficulty, Exercise, ExerciseContent, SubmittedAnswers};
pub use ids::{ExerciseId, IdError, MissionId, TransactionId, UserId};
pub use mission::{
    ActionType, Mission, MissionStatus, MissionTemplate, MissionType, Objective, ObjectiveSpec,
    RewardBundle,
};
pub use rank::{ProgressSnapshot, Rank, RankRecord, RankRequirements};
pub use reward::{BonusKind, RewardBreakdown, RewardInputs, SubmissionMeta};
pub use scoring::{score, ScoreError, ScoreOutcome};
pub use streak::{StreakChange, STREAK_EXPIRY_HOURS};
pub use transaction::{CoinTransaction, TransactionDraft, TransactionType};
