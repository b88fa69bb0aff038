//! Achievements: one-time unlockable rewards tied to statistical thresholds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RewardBundle, UserId};

/// A named counter an achievement condition can threshold on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    /// Exercises completed.
    ExercisesCompleted,
    /// Submissions with a raw score of 100.
    PerfectScores,
    /// Lifetime coins earned.
    CoinsEarned,
    /// Lifetime XP.
    TotalXp,
    /// Best streak ever reached.
    BestStreak,
    /// Modules completed.
    ModulesCompleted,
    /// First-attempt passes.
    FirstAttemptPasses,
    /// Missions claimed.
    MissionsClaimed,
}

/// A threshold condition over one stat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// The counter to check.
    pub stat: StatKey,
    /// Unlock once the counter reaches this value.
    pub threshold: i64,
}

impl Condition {
    /// Whether the stats satisfy this condition.
    #[must_use]
    pub fn is_met(&self, stats: &PlayerStats) -> bool {
        stats.value(self.stat) >= self.threshold
    }
}

/// A static catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementDef {
    /// Stable slug id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Unlock condition.
    pub condition: Condition,
    /// Rewards credited on unlock.
    pub rewards: RewardBundle,
}

/// A per-user unlock record. At most one per (user, achievement).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAchievement {
    /// The learner.
    pub user_id: UserId,
    /// The achievement slug.
    pub achievement_id: String,
    /// When it was unlocked.
    pub unlocked_at: DateTime<Utc>,
}

/// The stat snapshot achievement conditions are evaluated against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Exercises completed.
    pub exercises_completed: i64,
    /// Perfect raw scores.
    pub perfect_scores: i64,
    /// Lifetime coins earned.
    pub coins_earned: i64,
    /// Lifetime XP.
    pub total_xp: i64,
    /// Best streak.
    pub best_streak: i64,
    /// Modules completed.
    pub modules_completed: i64,
    /// First-attempt passes.
    pub first_attempt_passes: i64,
    /// Missions claimed.
    pub missions_claimed: i64,
}

impl PlayerStats {
    /// Read one counter by key.
    #[must_use]
    pub const fn value(&self, key: StatKey) -> i64 {
        match key {
            StatKey::ExercisesCompleted => self.exercises_completed,
            StatKey::PerfectScores => self.perfect_scores,
            StatKey::CoinsEarned => self.coins_earned,
            StatKey::TotalXp => self.total_xp,
            StatKey::BestStreak => self.best_streak,
            StatKey::ModulesCompleted => self.modules_completed,
            StatKey::FirstAttemptPasses => self.first_attempt_passes,
            StatKey::MissionsClaimed => self.missions_claimed,
        }
    }
}
