//! Rank checks and promotions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ml_rewards_core::{
    ActionType, EconomyState, ProgressSnapshot, Rank, RankRecord, UserId,
};
use ml_rewards_store::{PromotionOutcome, Store};

use crate::engine::events;
use crate::error::ApiError;
use crate::notify::{self, OutboundEvent};
use crate::state::AppState;

/// The result of checking promotion eligibility.
#[derive(Debug, Clone)]
pub struct PromotionCheck {
    /// The rank currently held.
    pub current: Rank,
    /// The rank a promotion would grant, `None` at the top.
    pub next: Option<Rank>,
    /// Unmet requirements for `next`; empty means eligible.
    pub unmet: Vec<String>,
}

impl PromotionCheck {
    /// Whether a promotion would succeed right now.
    #[must_use]
    pub fn eligible(&self) -> bool {
        self.next.is_some() && self.unmet.is_empty()
    }
}

/// The progress snapshot rank requirements are checked against.
#[must_use]
pub fn snapshot(economy: &EconomyState) -> ProgressSnapshot {
    ProgressSnapshot {
        total_xp: economy.total_xp,
        modules_completed: economy.stats.modules_completed,
        coins_earned: economy.earned_total,
        achievements_unlocked: economy.stats.achievements_unlocked,
        average_score: economy.stats.average_score(),
    }
}

/// The rank a learner currently holds, Nacom when none was recorded.
///
/// # Errors
///
/// Returns an error if the store fails.
pub fn held_rank(state: &Arc<AppState>, user_id: &UserId) -> Result<Rank, ApiError> {
    Ok(state
        .store
        .current_rank(user_id)?
        .map_or(Rank::Nacom, |record| record.rank))
}

/// 1-based position of a rank on the ladder, for level objectives.
#[must_use]
pub fn ladder_position(rank: Rank) -> i64 {
    Rank::ORDER
        .iter()
        .position(|r| *r == rank)
        .and_then(|i| i64::try_from(i + 1).ok())
        .unwrap_or(1)
}

/// Check whether the learner can be promoted into the next rank.
///
/// # Errors
///
/// Returns an error if the store fails.
pub fn check(state: &Arc<AppState>, user_id: &UserId) -> Result<PromotionCheck, ApiError> {
    let current = held_rank(state, user_id)?;
    let Some(next) = current.next() else {
        return Ok(PromotionCheck {
            current,
            next: None,
            unmet: Vec::new(),
        });
    };

    let tier = state
        .config
        .catalog
        .tier_for(next)
        .ok_or_else(|| ApiError::Internal(format!("no tier configured for rank {next}")))?;

    let economy = state
        .store
        .get_economy(user_id)?
        .unwrap_or_else(|| EconomyState::new(*user_id));

    Ok(PromotionCheck {
        current,
        next: Some(next),
        unmet: tier.requirements.unmet(&snapshot(&economy)),
    })
}

/// Promote the learner one rank, crediting the tier's signing bonus.
///
/// # Errors
///
/// - [`ApiError::MaxRankReached`] at the top of the ladder.
/// - [`ApiError::PromotionRequirementsNotMet`] when any threshold is
///   short.
pub fn promote(
    state: &Arc<AppState>,
    user_id: &UserId,
    now: DateTime<Utc>,
) -> Result<PromotionOutcome, ApiError> {
    let checked = check(state, user_id)?;
    let Some(next) = checked.next else {
        return Err(ApiError::MaxRankReached);
    };
    if !checked.unmet.is_empty() {
        return Err(ApiError::PromotionRequirementsNotMet {
            unmet: checked.unmet,
        });
    }

    let bonus_coins = state
        .config
        .catalog
        .tier_for(next)
        .map_or(0, |tier| tier.bonus_coins);

    let record = RankRecord {
        user_id: *user_id,
        rank: next,
        previous_rank: Some(checked.current),
        achieved_at: now,
        bonus_coins,
        is_current: true,
    };

    let outcome = state.store.promote(&record)?;

    tracing::info!(
        user_id = %user_id,
        rank = %next,
        bonus_coins,
        "Learner promoted"
    );

    let mut actions = vec![(ActionType::ReachRank, ladder_position(next))];
    if bonus_coins > 0 {
        actions.push((ActionType::EarnCoins, bonus_coins));
    }
    events::record_actions(state, user_id, &actions, now);

    notify::send(
        &state.notifier,
        OutboundEvent::new(
            "rank_up",
            *user_id,
            serde_json::json!({
                "rank": next.as_str(),
                "previous_rank": checked.current.as_str(),
                "bonus_coins": bonus_coins,
            }),
        ),
    );

    Ok(outcome)
}

/// Promote the learner through every tier they now qualify for.
///
/// Runs after submissions and claims; store failures are logged, never
/// propagated. Returns the promotions that happened.
pub fn auto_check(
    state: &Arc<AppState>,
    user_id: &UserId,
    now: DateTime<Utc>,
) -> Vec<PromotionOutcome> {
    let mut promotions = Vec::new();
    loop {
        match check(state, user_id) {
            Ok(checked) if checked.eligible() => match promote(state, user_id, now) {
                Ok(outcome) => promotions.push(outcome),
                Err(e) => {
                    tracing::warn!(user_id = %user_id, error = %e, "Auto-promotion failed");
                    break;
                }
            },
            Ok(_) => break,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Rank check failed");
                break;
            }
        }
    }
    promotions
}
