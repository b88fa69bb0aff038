//! Mission handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use ml_rewards_core::{
    ActionType, Mission, MissionId, MissionStatus, MissionType, Objective, RewardBundle, UserId,
};
use ml_rewards_store::Store;

use crate::auth::{AuthUser, ServiceAuth};
use crate::engine::{achievements, events, quests, ranks};
use crate::error::ApiError;
use crate::handlers::coins::TransactionResponse;
use crate::notify::{self, OutboundEvent};
use crate::state::AppState;

/// One objective with live progress.
#[derive(Debug, Serialize)]
pub struct ObjectiveResponse {
    /// The action being counted.
    pub action: ActionType,
    /// Target count.
    pub target: i64,
    /// Current count.
    pub current: i64,
    /// Completion percentage in [0, 100].
    pub percent: f64,
}

impl From<&Objective> for ObjectiveResponse {
    fn from(objective: &Objective) -> Self {
        Self {
            action: objective.action,
            target: objective.target,
            current: objective.current,
            percent: objective.percent(),
        }
    }
}

/// One mission instance.
#[derive(Debug, Serialize)]
pub struct MissionResponse {
    /// Mission ID.
    pub id: String,
    /// Template the instance came from.
    pub template_id: String,
    /// Cadence.
    pub mission_type: MissionType,
    /// Display title.
    pub title: String,
    /// Display description.
    pub description: String,
    /// Objectives with live progress.
    pub objectives: Vec<ObjectiveResponse>,
    /// Overall progress in [0, 100].
    pub progress: f64,
    /// Rewards on claim.
    pub rewards: RewardBundle,
    /// Lifecycle state.
    pub status: MissionStatus,
    /// Window start.
    pub start_date: String,
    /// Window end.
    pub end_date: String,
    /// When all objectives were met, if they were.
    pub completed_at: Option<String>,
    /// When rewards were claimed, if they were.
    pub claimed_at: Option<String>,
}

impl From<&Mission> for MissionResponse {
    fn from(mission: &Mission) -> Self {
        Self {
            id: mission.id.to_string(),
            template_id: mission.template_id.clone(),
            mission_type: mission.mission_type,
            title: mission.title.clone(),
            description: mission.description.clone(),
            objectives: mission.objectives.iter().map(ObjectiveResponse::from).collect(),
            progress: mission.progress(),
            rewards: mission.rewards.clone(),
            status: mission.status,
            start_date: mission.start_date.to_rfc3339(),
            end_date: mission.end_date.to_rfc3339(),
            completed_at: mission.completed_at.map(|t| t.to_rfc3339()),
            claimed_at: mission.claimed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Mission list response.
#[derive(Debug, Serialize)]
pub struct MissionListResponse {
    /// The missions for the requested cadence's current period.
    pub missions: Vec<MissionResponse>,
}

/// List the current user's missions for a cadence, generating the
/// period's set on first touch.
pub async fn list_missions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(mission_type): Path<String>,
) -> Result<Json<MissionListResponse>, ApiError> {
    let mission_type = match mission_type.as_str() {
        "daily" => MissionType::Daily,
        "weekly" => MissionType::Weekly,
        "special" => MissionType::Special,
        other => {
            return Err(ApiError::Validation(format!(
                "Unknown mission type: {other}"
            )))
        }
    };

    let missions = quests::ensure_missions(&state, &auth.user_id, mission_type, Utc::now())?;

    Ok(Json(MissionListResponse {
        missions: missions.iter().map(MissionResponse::from).collect(),
    }))
}

/// Claim response.
#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    /// The mission, now claimed.
    pub mission: MissionResponse,
    /// Balance after the rewards.
    pub balance: i64,
    /// Lifetime XP after the rewards.
    pub total_xp: i64,
    /// The reward ledger row, when the mission paid coins.
    pub transaction: Option<TransactionResponse>,
}

/// Claim a completed mission's rewards.
pub async fn claim(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(mission_id): Path<String>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let mission_id = mission_id
        .parse::<MissionId>()
        .map_err(|_| ApiError::Validation("Invalid mission id".into()))?;

    let now = Utc::now();
    let outcome = state.store.claim_mission(&auth.user_id, &mission_id, now)?;

    tracing::info!(
        user_id = %auth.user_id,
        mission_id = %mission_id,
        coins = outcome.mission.rewards.coins,
        xp = outcome.mission.rewards.xp,
        "Mission claimed"
    );

    // Claim rewards count toward earn objectives and achievements.
    let mut actions = Vec::new();
    if outcome.mission.rewards.coins > 0 {
        actions.push((ActionType::EarnCoins, outcome.mission.rewards.coins));
    }
    if outcome.mission.rewards.xp > 0 {
        actions.push((ActionType::EarnXp, outcome.mission.rewards.xp));
    }
    events::record_actions(&state, &auth.user_id, &actions, now);
    achievements::evaluate(&state, &auth.user_id, now);
    ranks::auto_check(&state, &auth.user_id, now);

    if outcome.mission.rewards.coins > 0 {
        notify::send(
            &state.notifier,
            OutboundEvent::new(
                "coins_earned",
                auth.user_id,
                serde_json::json!({
                    "amount": outcome.mission.rewards.coins,
                    "balance": outcome.state.balance,
                    "reference": outcome.mission.id.to_string(),
                }),
            ),
        );
    }

    Ok(Json(ClaimResponse {
        mission: MissionResponse::from(&outcome.mission),
        balance: outcome.state.balance,
        total_xp: outcome.state.total_xp,
        transaction: outcome
            .transaction
            .as_ref()
            .map(TransactionResponse::from),
    }))
}

/// Action report, sent by the content platform for events the engine
/// cannot observe itself (logins, module/lesson completions).
#[derive(Debug, Deserialize)]
pub struct ActionReport {
    /// The learner the action belongs to.
    pub user_id: UserId,
    /// The action performed.
    pub action_type: ActionType,
    /// How much of it (count or absolute level).
    #[serde(default = "default_amount")]
    pub amount: i64,
}

fn default_amount() -> i64 {
    1
}

/// Action report response.
#[derive(Debug, Serialize)]
pub struct ActionReportResponse {
    /// Mission ids the report completed.
    pub completed_missions: Vec<String>,
    /// Achievement slugs the report unlocked.
    pub unlocked_achievements: Vec<String>,
    /// Ranks the report promoted the learner into.
    pub promotions: Vec<String>,
}

/// Record an externally observed action against missions,
/// achievements, and ranks.
pub async fn report_action(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Json(body): Json<ActionReport>,
) -> Result<Json<ActionReportResponse>, ApiError> {
    if body.amount <= 0 {
        return Err(ApiError::Validation("amount must be positive".into()));
    }

    let now = Utc::now();

    // Module completions feed rank requirements, so they also land in
    // the learner's aggregate stats.
    if body.action_type == ActionType::CompleteModules {
        let mut economy = state
            .store
            .get_economy(&body.user_id)?
            .unwrap_or_else(|| ml_rewards_core::EconomyState::new(body.user_id));
        economy.stats.modules_completed += u64::try_from(body.amount).unwrap_or(0);
        economy.updated_at = now;
        state.store.put_economy(&economy)?;
    }

    if body.action_type == ActionType::DailyLogin {
        state.store.log_activity(&body.user_id, now)?;
    }

    let completed =
        events::record_actions(&state, &body.user_id, &[(body.action_type, body.amount)], now);
    let unlocked = achievements::evaluate(&state, &body.user_id, now);
    let promotions = ranks::auto_check(&state, &body.user_id, now);

    Ok(Json(ActionReportResponse {
        completed_missions: completed.iter().map(|m| m.id.to_string()).collect(),
        unlocked_achievements: unlocked
            .iter()
            .map(|o| o.unlock.achievement_id.clone())
            .collect(),
        promotions: promotions
            .iter()
            .map(|p| p.record.rank.as_str().to_string())
            .collect(),
    }))
}
