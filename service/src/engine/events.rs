//! Action dispatch into mission progress.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ml_rewards_core::{ActionType, Mission, UserId};
use ml_rewards_store::Store;

use crate::notify::{self, OutboundEvent};
use crate::state::AppState;

/// Apply a batch of actions to the learner's progressable missions.
///
/// Each action is isolated: a store failure is logged and the remaining
/// actions still run. Returns every mission the batch completed, with a
/// `mission_completed` event sent for each.
pub fn record_actions(
    state: &Arc<AppState>,
    user_id: &UserId,
    actions: &[(ActionType, i64)],
    now: DateTime<Utc>,
) -> Vec<Mission> {
    let mut completed = Vec::new();

    for &(action, amount) in actions {
        if amount <= 0 {
            continue;
        }
        match state.store.apply_mission_action(user_id, action, amount, now) {
            Ok(missions) => completed.extend(missions),
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    action = ?action,
                    error = %e,
                    "Failed to apply mission action"
                );
            }
        }
    }

    for mission in &completed {
        notify::send(
            &state.notifier,
            OutboundEvent::new(
                "mission_completed",
                *user_id,
                serde_json::json!({
                    "mission_id": mission.id.to_string(),
                    "title": mission.title,
                    "rewards": mission.rewards,
                }),
            ),
        );
    }

    completed
}
