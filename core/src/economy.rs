//! Per-user economy state.
//!
//! One [`EconomyState`] record exists per learner, created lazily on the
//! first reward event. All balance changes flow through [`EconomyState::apply_earn`]
//! and [`EconomyState::apply_spend`] so the ledger invariants hold everywhere.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// The coin/XP/streak state of a single learner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyState {
    /// The learner this state belongs to.
    pub user_id: UserId,

    /// Current ML Coin balance. Never negative.
    pub balance: i64,

    /// Lifetime coins earned. `balance == earned_total - spent_total`.
    pub earned_total: i64,

    /// Lifetime coins spent.
    pub spent_total: i64,

    /// Coins earned during `earned_today_on` (UTC). Rolled lazily on write.
    pub earned_today: i64,

    /// The UTC day `earned_today` refers to.
    pub earned_today_on: NaiveDate,

    /// Lifetime experience points.
    pub total_xp: i64,

    /// Consecutive activity days, as of `last_activity_at`.
    pub current_streak: u32,

    /// Best streak ever reached.
    pub best_streak: u32,

    /// Last qualifying activity, if any.
    pub last_activity_at: Option<DateTime<Utc>>,

    /// Aggregate learning counters used by ranks and achievements.
    pub stats: LearningStats,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl EconomyState {
    /// Create a fresh zero-balance state.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            balance: 0,
            earned_total: 0,
            spent_total: 0,
            earned_today: 0,
            earned_today_on: now.date_naive(),
            total_xp: 0,
            current_streak: 0,
            best_streak: 0,
            last_activity_at: None,
            stats: LearningStats::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the balance covers a spend of `amount`.
    #[must_use]
    pub const fn can_spend(&self, amount: i64) -> bool {
        self.balance >= amount
    }

    /// Credit `amount` coins, keeping the balance/lifetime invariant.
    ///
    /// The daily-earned counter is rolled to `now`'s UTC day before the
    /// credit lands, so `earned_today` never mixes days.
    pub fn apply_earn(&mut self, amount: i64, now: DateTime<Utc>) {
        debug_assert!(amount >= 0);
        self.roll_daily_window(now.date_naive());
        self.balance += amount;
        self.earned_total += amount;
        self.earned_today += amount;
        self.updated_at = now;
    }

    /// Debit `amount` coins. The caller must have verified sufficiency;
    /// the invariant check here is the last line of defence.
    ///
    /// # Panics
    ///
    /// Debug builds panic if the debit would drive the balance negative.
    pub fn apply_spend(&mut self, amount: i64, now: DateTime<Utc>) {
        debug_assert!(amount >= 0);
        debug_assert!(self.balance >= amount, "spend would overdraw balance");
        self.balance -= amount;
        self.spent_total += amount;
        self.updated_at = now;
    }

    /// Add experience points.
    pub fn apply_xp(&mut self, xp: i64, now: DateTime<Utc>) {
        debug_assert!(xp >= 0);
        self.total_xp += xp;
        self.updated_at = now;
    }

    fn roll_daily_window(&mut self, today: NaiveDate) {
        if self.earned_today_on != today {
            self.earned_today = 0;
            self.earned_today_on = today;
        }
    }
}

/// Aggregate counters fed into rank checks and achievement conditions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearningStats {
    /// Exercises completed (auto-graded submissions that settled).
    pub exercises_completed: u64,

    /// Submissions with a raw score of 100.
    pub perfect_scores: u64,

    /// Submissions passed on the first attempt.
    pub first_attempt_passes: u64,

    /// Modules completed (reported by the content platform).
    pub modules_completed: u64,

    /// Sum of final scores, for the rolling average.
    pub score_sum: u64,

    /// Number of scores contributing to `score_sum`.
    pub score_count: u64,

    /// Achievements unlocked so far.
    pub achievements_unlocked: u64,

    /// Missions claimed so far.
    pub missions_claimed: u64,
}

impl LearningStats {
    /// Rolling average final score, 0.0 when nothing was scored yet.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_score(&self) -> f64 {
        if self.score_count == 0 {
            0.0
        } else {
            self.score_sum as f64 / self.score_count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_state_is_zeroed() {
        let state = EconomyState::new(UserId::generate());
        assert_eq!(state.balance, 0);
        assert_eq!(state.earned_total, 0);
        assert_eq!(state.current_streak, 0);
        assert!(state.last_activity_at.is_none());
    }

    #[test]
    fn earn_and_spend_keep_invariant() {
        let mut state = EconomyState::new(UserId::generate());
        let now = Utc::now();

        state.apply_earn(120, now);
        state.apply_spend(45, now);

        assert_eq!(state.balance, 75);
        assert_eq!(state.balance, state.earned_total - state.spent_total);
    }

    #[test]
    fn earned_today_rolls_over_at_midnight() {
        let mut state = EconomyState::new(UserId::generate());
        let day1 = Utc.with_ymd_and_hms(2026, 3, 1, 20, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2026, 3, 2, 1, 0, 0).unwrap();

        state.apply_earn(50, day1);
        assert_eq!(state.earned_today, 50);

        state.apply_earn(10, day2);
        assert_eq!(state.earned_today, 10);
        assert_eq!(state.earned_total, 60);
    }

    #[test]
    fn average_score_handles_empty() {
        let stats = LearningStats::default();
        assert!((stats.average_score() - 0.0).abs() < f64::EPSILON);
    }
}
