//! The reward calculator: raw score + multipliers + bonus rules → payout.
//!
//! Pure and deterministic for identical inputs, which is what makes the
//! pipeline reproducible in tests and safe to retry.

use serde::{Deserialize, Serialize};

use crate::Difficulty;

/// Cap on the streak multiplier's bonus portion.
const STREAK_BONUS_CAP: f64 = 0.5;

/// Streak bonus per consecutive day.
const STREAK_BONUS_PER_DAY: f64 = 0.05;

/// Penalty points per power-up used.
const POWERUP_PENALTY: i64 = 5;

/// Submission metadata feeding bonus/penalty rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionMeta {
    /// Wall-clock seconds the learner spent before submitting.
    pub time_spent_seconds: u32,

    /// Power-ups (hints etc.) used during the attempt.
    #[serde(default)]
    pub powerups_used: u32,

    /// 1-based attempt number for this exercise.
    #[serde(default = "first_attempt")]
    pub attempt: u32,
}

fn first_attempt() -> u32 {
    1
}

/// Everything the calculator needs for one submission.
#[derive(Debug, Clone)]
pub struct RewardInputs {
    /// Raw percentage from the scorer, [0, 100].
    pub raw_score: f64,

    /// Exercise difficulty.
    pub difficulty: Difficulty,

    /// Multiplier of the learner's current rank.
    pub rank_multiplier: f64,

    /// Effective streak length in days.
    pub streak_days: u32,

    /// Estimated completion time, if the exercise declares one.
    pub estimated_seconds: Option<u32>,

    /// Submission metadata.
    pub meta: SubmissionMeta,

    /// Base coin payout at a final score of 100.
    pub coin_reward: i64,

    /// Base XP payout at a final score of 100.
    pub xp_reward: i64,
}

/// An additive bonus rule that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusKind {
    /// Raw score of 100.
    PerfectScore,
    /// No power-ups used.
    NoPowerups,
    /// Finished in under 75% of the estimated time.
    SpeedRun,
    /// First attempt with a raw score of at least 80.
    FirstAttempt,
}

impl BonusKind {
    /// Points this bonus adds to the final score.
    #[must_use]
    pub const fn points(self) -> i64 {
        match self {
            Self::PerfectScore | Self::FirstAttempt => 10,
            Self::NoPowerups | Self::SpeedRun => 5,
        }
    }
}

/// The computed payout for one submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardBreakdown {
    /// Final score, an integer in [0, 100].
    pub final_score: u8,

    /// Coins to credit.
    pub coins: i64,

    /// XP to credit.
    pub xp: i64,

    /// Bonus rules that fired, in evaluation order.
    pub bonuses: Vec<BonusKind>,

    /// Points subtracted for power-up usage.
    pub penalty: i64,

    /// Combined difficulty × rank × streak multiplier.
    pub multiplier: f64,

    /// Whether the raw score was 100.
    pub is_perfect: bool,
}

/// The streak multiplier: `1 + min(days × 0.05, 0.5)`.
#[must_use]
pub fn streak_multiplier(days: u32) -> f64 {
    1.0 + (f64::from(days) * STREAK_BONUS_PER_DAY).min(STREAK_BONUS_CAP)
}

/// Compute the final score and payout for one submission.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn compute(inputs: &RewardInputs) -> RewardBreakdown {
    let raw = inputs.raw_score.clamp(0.0, 100.0);
    let multiplier = inputs.difficulty.multiplier()
        * inputs.rank_multiplier
        * streak_multiplier(inputs.streak_days);
    let base = raw * multiplier;

    let mut bonuses = Vec::new();
    if raw >= 100.0 {
        bonuses.push(BonusKind::PerfectScore);
    }
    if inputs.meta.powerups_used == 0 {
        bonuses.push(BonusKind::NoPowerups);
    }
    if let Some(estimated) = inputs.estimated_seconds {
        if estimated > 0 && f64::from(inputs.meta.time_spent_seconds) < f64::from(estimated) * 0.75
        {
            bonuses.push(BonusKind::SpeedRun);
        }
    }
    if inputs.meta.attempt <= 1 && raw >= 80.0 {
        bonuses.push(BonusKind::FirstAttempt);
    }

    let bonus_points: i64 = bonuses.iter().map(|b| b.points()).sum();
    let penalty = i64::from(inputs.meta.powerups_used) * POWERUP_PENALTY;

    #[allow(clippy::cast_precision_loss)]
    let final_score = (base + bonus_points as f64 - penalty as f64)
        .clamp(0.0, 100.0)
        .round() as u8;

    let payout = |base_reward: i64| {
        #[allow(clippy::cast_precision_loss)]
        let scaled = f64::from(final_score) / 100.0 * base_reward as f64;
        scaled.floor() as i64
    };

    RewardBreakdown {
        final_score,
        coins: payout(inputs.coin_reward),
        xp: payout(inputs.xp_reward),
        bonuses,
        penalty,
        multiplier,
        is_perfect: raw >= 100.0,
    }
}
