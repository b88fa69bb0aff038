//! Missions: time-boxed objective sets generated from templates.
//!
//! Status transitions are monotonic: `active → in_progress → completed →
//! claimed`, with `expired` as a terminal branch from the first two once
//! the end date passes. Progress is always recomputed from the objectives;
//! it is never stored separately.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{MissionId, UserId};

/// Mission cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionType {
    /// Regenerated every day at 00:00 UTC.
    Daily,
    /// Regenerated every Monday at 00:00 UTC.
    Weekly,
    /// Event missions with bespoke windows.
    Special,
}

impl MissionType {
    /// Stable lowercase name, matching the serde representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Special => "special",
        }
    }
}

/// Mission lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    /// Generated, no progress yet.
    Active,
    /// At least one objective has progress.
    InProgress,
    /// All objectives met; rewards claimable.
    Completed,
    /// Rewards credited.
    Claimed,
    /// End date passed before completion. Terminal.
    Expired,
}

impl MissionStatus {
    /// Whether objective progress still applies in this state.
    #[must_use]
    pub const fn accepts_progress(self) -> bool {
        matches!(self, Self::Active | Self::InProgress)
    }
}

/// A trackable action type. Closed enum: the scorer, orchestrator, and
/// quest engine all match on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Settled exercise submissions.
    CompleteExercises,
    /// Raw score of 100.
    PerfectScores,
    /// ML Coins earned.
    EarnCoins,
    /// XP earned.
    EarnXp,
    /// ML Coins spent.
    SpendCoins,
    /// Streak reached N days.
    MaintainStreak,
    /// Modules completed.
    CompleteModules,
    /// Lessons completed.
    CompleteLessons,
    /// Achievements unlocked.
    UnlockAchievements,
    /// Reached a rank index (1-based ladder position).
    ReachRank,
    /// Exercises passed on the first attempt.
    FirstAttemptPasses,
    /// Exercises finished under 75% of the estimated time.
    SpeedRuns,
    /// Exercises completed without any power-up.
    NoPowerupCompletions,
    /// Days with at least one login/activity.
    DailyLogin,
}

impl ActionType {
    /// Level actions report an absolute value ("streak is now 5 days",
    /// "rank index is now 3") rather than an increment; objectives track
    /// their high-water mark instead of accumulating.
    #[must_use]
    pub const fn is_level(self) -> bool {
        matches!(self, Self::MaintainStreak | Self::ReachRank)
    }
}

/// One trackable sub-goal of a mission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    /// The action being counted.
    pub action: ActionType,
    /// Target count.
    pub target: i64,
    /// Current count, capped at `target`.
    pub current: i64,
}

impl Objective {
    /// Completion percentage of this objective, in [0, 100].
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f64 {
        if self.target <= 0 {
            100.0
        } else {
            (self.current as f64 / self.target as f64 * 100.0).clamp(0.0, 100.0)
        }
    }

    /// Whether the target is reached.
    #[must_use]
    pub const fn is_met(&self) -> bool {
        self.current >= self.target
    }
}

/// An objective as declared by a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveSpec {
    /// The action to count.
    pub action: ActionType,
    /// Target count.
    pub target: i64,
}

/// Rewards granted when a mission is claimed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewardBundle {
    /// ML Coins.
    pub coins: i64,
    /// Experience points.
    pub xp: i64,
    /// Cosmetic/item grants, by slug.
    #[serde(default)]
    pub items: Vec<String>,
}

/// A static mission template from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionTemplate {
    /// Stable template id.
    pub id: String,
    /// Which pool the template belongs to.
    pub mission_type: MissionType,
    /// Display title.
    pub title: String,
    /// Display description.
    pub description: String,
    /// Objectives to instantiate.
    pub objectives: Vec<ObjectiveSpec>,
    /// Rewards on claim.
    pub rewards: RewardBundle,
}

/// A mission instance for one learner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    /// Instance id (ULID).
    pub id: MissionId,
    /// The learner.
    pub user_id: UserId,
    /// Template this instance came from.
    pub template_id: String,
    /// Cadence.
    pub mission_type: MissionType,
    /// Display title.
    pub title: String,
    /// Display description.
    pub description: String,
    /// Objectives with live progress.
    pub objectives: Vec<Objective>,
    /// Rewards on claim.
    pub rewards: RewardBundle,
    /// Lifecycle state.
    pub status: MissionStatus,
    /// Window start.
    pub start_date: DateTime<Utc>,
    /// Window end; progress stops here.
    pub end_date: DateTime<Utc>,
    /// When all objectives were met.
    pub completed_at: Option<DateTime<Utc>>,
    /// When rewards were claimed.
    pub claimed_at: Option<DateTime<Utc>>,
}

impl Mission {
    /// Instantiate a template for a learner over a period window.
    #[must_use]
    pub fn instantiate(
        template: &MissionTemplate,
        user_id: UserId,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MissionId::generate(),
            user_id,
            template_id: template.id.clone(),
            mission_type: template.mission_type,
            title: template.title.clone(),
            description: template.description.clone(),
            objectives: template
                .objectives
                .iter()
                .map(|spec| Objective {
                    action: spec.action,
                    target: spec.target,
                    current: 0,
                })
                .collect(),
            rewards: template.rewards.clone(),
            status: MissionStatus::Active,
            start_date,
            end_date,
            completed_at: None,
            claimed_at: None,
        }
    }

    /// Overall progress: mean objective percentage, clamped to [0, 100].
    ///
    /// Deterministic over `objectives`; recomputing always reproduces the
    /// reported value.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        if self.objectives.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.objectives.iter().map(Objective::percent).sum();
        (sum / self.objectives.len() as f64).clamp(0.0, 100.0)
    }

    /// Apply `amount` of `action` to every matching objective.
    ///
    /// Returns `true` when this call completed the mission. Counts are
    /// capped at their targets; missions outside active/in-progress are
    /// untouched.
    pub fn apply_action(&mut self, action: ActionType, amount: i64, now: DateTime<Utc>) -> bool {
        if !self.status.accepts_progress() || amount <= 0 {
            return false;
        }

        let mut touched = false;
        for objective in &mut self.objectives {
            if objective.action == action && !objective.is_met() {
                objective.current = if action.is_level() {
                    objective.current.max(amount.min(objective.target))
                } else {
                    (objective.current + amount).min(objective.target)
                };
                touched = true;
            }
        }

        if !touched {
            return false;
        }

        if self.objectives.iter().all(Objective::is_met) {
            self.status = MissionStatus::Completed;
            self.completed_at = Some(now);
            true
        } else {
            self.status = MissionStatus::InProgress;
            false
        }
    }

    /// Whether the window has closed without completion.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status.accepts_progress() && now > self.end_date
    }

    /// Flip to expired. Only valid from active/in-progress.
    pub fn expire(&mut self) {
        if self.status.accepts_progress() {
            self.status = MissionStatus::Expired;
        }
    }
}
