//! The rank ladder and promotion rules.
//!
//! Five ordered ranks; learners only move forward, one step at a time.
//! Promotion thresholds live in the [`crate::EngineCatalog`], not here,
//! so tests can run against alternate ladders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::UserId;

/// A learner rank, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    /// Starting rank.
    Nacom,
    /// Second rank.
    Batab,
    /// Third rank.
    Holcatte,
    /// Fourth rank.
    Guerrero,
    /// Terminal rank.
    Mercenario,
}

impl Rank {
    /// All ranks in ascending order.
    pub const ORDER: [Self; 5] = [
        Self::Nacom,
        Self::Batab,
        Self::Holcatte,
        Self::Guerrero,
        Self::Mercenario,
    ];

    /// Permanent reward multiplier granted by this rank.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Nacom => 1.0,
            Self::Batab => 1.1,
            Self::Holcatte => 1.25,
            Self::Guerrero => 1.5,
            Self::Mercenario => 2.0,
        }
    }

    /// The next rank up, or `None` at the top.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Nacom => Some(Self::Batab),
            Self::Batab => Some(Self::Holcatte),
            Self::Holcatte => Some(Self::Guerrero),
            Self::Guerrero => Some(Self::Mercenario),
            Self::Mercenario => None,
        }
    }

    /// Stable lowercase name, matching the serde representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nacom => "nacom",
            Self::Batab => "batab",
            Self::Holcatte => "holcatte",
            Self::Guerrero => "guerrero",
            Self::Mercenario => "mercenario",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds a learner must meet to reach a rank.
///
/// All five sub-conditions must hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankRequirements {
    /// Minimum lifetime XP.
    pub min_xp: i64,
    /// Minimum modules completed.
    pub min_modules: u64,
    /// Minimum lifetime coins earned.
    pub min_coins_earned: i64,
    /// Minimum achievements unlocked.
    pub min_achievements: u64,
    /// Minimum rolling average score.
    pub min_average_score: f64,
}

impl RankRequirements {
    /// The human-readable list of unmet conditions, empty when all hold.
    #[must_use]
    pub fn unmet(&self, snapshot: &ProgressSnapshot) -> Vec<String> {
        let mut unmet = Vec::new();
        if snapshot.total_xp < self.min_xp {
            unmet.push(format!(
                "XP: {} of {} required",
                snapshot.total_xp, self.min_xp
            ));
        }
        if snapshot.modules_completed < self.min_modules {
            unmet.push(format!(
                "Modules completed: {} of {} required",
                snapshot.modules_completed, self.min_modules
            ));
        }
        if snapshot.coins_earned < self.min_coins_earned {
            unmet.push(format!(
                "Coins earned: {} of {} required",
                snapshot.coins_earned, self.min_coins_earned
            ));
        }
        if snapshot.achievements_unlocked < self.min_achievements {
            unmet.push(format!(
                "Achievements unlocked: {} of {} required",
                snapshot.achievements_unlocked, self.min_achievements
            ));
        }
        if snapshot.average_score < self.min_average_score {
            unmet.push(format!(
                "Average score: {:.1} of {:.1} required",
                snapshot.average_score, self.min_average_score
            ));
        }
        unmet
    }

    /// Whether all sub-conditions hold.
    #[must_use]
    pub fn met_by(&self, snapshot: &ProgressSnapshot) -> bool {
        self.unmet(snapshot).is_empty()
    }
}

/// A learner's aggregate progress, compared against [`RankRequirements`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Lifetime XP.
    pub total_xp: i64,
    /// Modules completed.
    pub modules_completed: u64,
    /// Lifetime coins earned.
    pub coins_earned: i64,
    /// Achievements unlocked.
    pub achievements_unlocked: u64,
    /// Rolling average score.
    pub average_score: f64,
}

/// One rank assignment. Exactly one record per user has `is_current`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankRecord {
    /// The learner.
    pub user_id: UserId,
    /// The rank held.
    pub rank: Rank,
    /// The rank held before this one, if any.
    pub previous_rank: Option<Rank>,
    /// When the rank was achieved.
    pub achieved_at: DateTime<Utc>,
    /// Signing bonus credited on promotion.
    pub bonus_coins: i64,
    /// Whether this is the learner's current rank.
    pub is_current: bool,
}

impl RankRecord {
    /// The implicit starting record for a learner with no rank history.
    #[must_use]
    pub fn initial(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            rank: Rank::Nacom,
            previous_rank: None,
            achieved_at: now,
            bonus_coins: 0,
            is_current: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_order_is_strict() {
        for pair in Rank::ORDER.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(pair[0].next(), Some(pair[1]));
        }
        assert_eq!(Rank::Mercenario.next(), None);
    }

    #[test]
    fn multipliers_ascend() {
        let mults: Vec<f64> = Rank::ORDER.iter().map(|r| r.multiplier()).collect();
        for pair in mults.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn unmet_lists_only_shortfalls() {
        let requirements = RankRequirements {
            min_xp: 600,
            min_modules: 1,
            min_coins_earned: 250,
            min_achievements: 3,
            min_average_score: 60.0,
        };
        let snapshot = ProgressSnapshot {
            total_xp: 600,
            modules_completed: 1,
            coins_earned: 400,
            achievements_unlocked: 1,
            average_score: 70.0,
        };

        let unmet = requirements.unmet(&snapshot);
        assert_eq!(unmet.len(), 1);
        assert!(unmet[0].contains("Achievements"));
        assert!(!requirements.met_by(&snapshot));
    }

    #[test]
    fn met_when_everything_holds() {
        let requirements = RankRequirements {
            min_xp: 100,
            min_modules: 0,
            min_coins_earned: 0,
            min_achievements: 0,
            min_average_score: 0.0,
        };
        let snapshot = ProgressSnapshot {
            total_xp: 100,
            modules_completed: 0,
            coins_earned: 0,
            achievements_unlocked: 0,
            average_score: 0.0,
        };
        assert!(requirements.met_by(&snapshot));
    }
}
