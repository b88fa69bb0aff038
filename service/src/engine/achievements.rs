//! Achievement evaluation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ml_rewards_core::{ActionType, EconomyState, PlayerStats, UserId};
use ml_rewards_store::{Store, UnlockOutcome};

use crate::engine::events;
use crate::notify::{self, OutboundEvent};
use crate::state::AppState;

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// The stat snapshot achievement conditions read.
#[must_use]
pub fn player_stats(economy: &EconomyState) -> PlayerStats {
    PlayerStats {
        exercises_completed: clamp_i64(economy.stats.exercises_completed),
        perfect_scores: clamp_i64(economy.stats.perfect_scores),
        coins_earned: economy.earned_total,
        total_xp: economy.total_xp,
        best_streak: i64::from(economy.best_streak),
        modules_completed: clamp_i64(economy.stats.modules_completed),
        first_attempt_passes: clamp_i64(economy.stats.first_attempt_passes),
        missions_claimed: clamp_i64(economy.stats.missions_claimed),
    }
}

/// Unlock every catalog achievement whose condition the learner now
/// meets.
///
/// The store's unlock is idempotent, so re-evaluating held achievements
/// is harmless. Each unlock credits its rewards, feeds the
/// `unlock_achievements` mission action, and emits an
/// `achievement_unlocked` event. Failures on one unlock are logged and
/// the rest still run.
pub fn evaluate(
    state: &Arc<AppState>,
    user_id: &UserId,
    now: DateTime<Utc>,
) -> Vec<UnlockOutcome> {
    let economy = match state.store.get_economy(user_id) {
        Ok(Some(economy)) => economy,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to read economy state");
            return Vec::new();
        }
    };

    let stats = player_stats(&economy);
    let mut unlocked = Vec::new();

    for def in &state.config.catalog.achievements {
        if !def.condition.is_met(&stats) {
            continue;
        }
        match state.store.unlock_achievement(user_id, def, now) {
            Ok(Some(outcome)) => {
                tracing::info!(
                    user_id = %user_id,
                    achievement = %def.id,
                    "Achievement unlocked"
                );
                notify::send(
                    &state.notifier,
                    OutboundEvent::new(
                        "achievement_unlocked",
                        *user_id,
                        serde_json::json!({
                            "achievement_id": def.id,
                            "name": def.name,
                            "rewards": def.rewards,
                        }),
                    ),
                );
                unlocked.push(outcome);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    achievement = %def.id,
                    error = %e,
                    "Failed to unlock achievement"
                );
            }
        }
    }

    if !unlocked.is_empty() {
        let count = i64::try_from(unlocked.len()).unwrap_or(i64::MAX);
        let coins: i64 = unlocked
            .iter()
            .filter_map(|o| o.transaction.as_ref())
            .map(|tx| tx.amount)
            .sum();

        let mut actions = vec![(ActionType::UnlockAchievements, count)];
        if coins > 0 {
            actions.push((ActionType::EarnCoins, coins));
        }
        events::record_actions(state, user_id, &actions, now);
    }

    unlocked
}
