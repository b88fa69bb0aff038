//! Achievement handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use ml_rewards_core::{ActionType, RewardBundle, StatKey, UserId};
use ml_rewards_store::Store;

use crate::auth::{AuthUser, ServiceAuth};
use crate::engine::events;
use crate::error::ApiError;
use crate::notify::{self, OutboundEvent};
use crate::state::AppState;

/// One catalog achievement with the learner's unlock state.
#[derive(Debug, Serialize)]
pub struct AchievementResponse {
    /// Stable slug id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// The counter the condition thresholds on.
    pub stat: StatKey,
    /// Unlock threshold.
    pub threshold: i64,
    /// Rewards credited on unlock.
    pub rewards: RewardBundle,
    /// Whether the learner holds it.
    pub unlocked: bool,
    /// When it was unlocked, if it was.
    pub unlocked_at: Option<String>,
}

/// Achievement list response.
#[derive(Debug, Serialize)]
pub struct AchievementListResponse {
    /// The full catalog with per-user unlock state.
    pub achievements: Vec<AchievementResponse>,
}

/// List the catalog merged with the current user's unlocks.
pub async fn list_achievements(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<AchievementListResponse>, ApiError> {
    let unlocks = state.store.list_unlocks(&auth.user_id)?;

    let achievements = state
        .config
        .catalog
        .achievements
        .iter()
        .map(|def| {
            let unlock = unlocks.iter().find(|u| u.achievement_id == def.id);
            AchievementResponse {
                id: def.id.clone(),
                name: def.name.clone(),
                description: def.description.clone(),
                stat: def.condition.stat,
                threshold: def.condition.threshold,
                rewards: def.rewards.clone(),
                unlocked: unlock.is_some(),
                unlocked_at: unlock.map(|u| u.unlocked_at.to_rfc3339()),
            }
        })
        .collect();

    Ok(Json(AchievementListResponse { achievements }))
}

/// Manual unlock request, for achievements granted by the platform
/// rather than evaluated from stats.
#[derive(Debug, Deserialize)]
pub struct UnlockRequest {
    /// The learner to grant the achievement to.
    pub user_id: UserId,
    /// The achievement slug.
    pub achievement_id: String,
}

/// Unlock response.
#[derive(Debug, Serialize)]
pub struct UnlockResponse {
    /// The achievement slug.
    pub achievement_id: String,
    /// When it was unlocked.
    pub unlocked_at: String,
    /// Balance after the rewards.
    pub balance: i64,
}

/// Grant an achievement directly. Service-to-service only.
pub async fn unlock(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Json(body): Json<UnlockRequest>,
) -> Result<Json<UnlockResponse>, ApiError> {
    let def = state
        .config
        .catalog
        .achievement(&body.achievement_id)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown achievement: {}", body.achievement_id)))?
        .clone();

    let now = Utc::now();
    let outcome = state
        .store
        .unlock_achievement(&body.user_id, &def, now)?
        .ok_or(ApiError::AchievementAlreadyUnlocked)?;

    tracing::info!(
        user_id = %body.user_id,
        achievement = %def.id,
        "Achievement granted"
    );

    let mut actions = vec![(ActionType::UnlockAchievements, 1)];
    if def.rewards.coins > 0 {
        actions.push((ActionType::EarnCoins, def.rewards.coins));
    }
    events::record_actions(&state, &body.user_id, &actions, now);

    notify::send(
        &state.notifier,
        OutboundEvent::new(
            "achievement_unlocked",
            body.user_id,
            serde_json::json!({
                "achievement_id": def.id,
                "name": def.name,
                "rewards": def.rewards,
            }),
        ),
    );

    Ok(Json(UnlockResponse {
        achievement_id: outcome.unlock.achievement_id,
        unlocked_at: outcome.unlock.unlocked_at.to_rfc3339(),
        balance: outcome.state.balance,
    }))
}
