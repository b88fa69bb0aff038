//! Rank handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use ml_rewards_core::{RankRecord, UserId};
use ml_rewards_store::Store;

use crate::auth::{AuthUser, ServiceAuth};
use crate::engine::ranks;
use crate::error::ApiError;
use crate::handlers::coins::TransactionResponse;
use crate::state::AppState;

/// One rank record.
#[derive(Debug, Serialize)]
pub struct RankRecordResponse {
    /// Rank name.
    pub rank: String,
    /// Rank held before this one, if any.
    pub previous_rank: Option<String>,
    /// When the rank was achieved.
    pub achieved_at: String,
    /// Signing bonus credited on promotion.
    pub bonus_coins: i64,
}

impl From<&RankRecord> for RankRecordResponse {
    fn from(record: &RankRecord) -> Self {
        Self {
            rank: record.rank.as_str().to_string(),
            previous_rank: record.previous_rank.map(|r| r.as_str().to_string()),
            achieved_at: record.achieved_at.to_rfc3339(),
            bonus_coins: record.bonus_coins,
        }
    }
}

/// Rank status response.
#[derive(Debug, Serialize)]
pub struct RankResponse {
    /// User ID.
    pub user_id: String,
    /// Current rank name.
    pub rank: String,
    /// Current rank multiplier.
    pub multiplier: f64,
    /// The next rank on the ladder, if any.
    pub next_rank: Option<String>,
    /// Whether a promotion would succeed right now.
    pub eligible: bool,
    /// Unmet requirements for the next rank.
    pub unmet: Vec<String>,
    /// Promotion history, oldest first.
    pub history: Vec<RankRecordResponse>,
}

async fn rank_status(
    state: &Arc<AppState>,
    user_id: &UserId,
) -> Result<RankResponse, ApiError> {
    let checked = ranks::check(state, user_id)?;
    let history = state.store.rank_history(user_id)?;

    Ok(RankResponse {
        user_id: user_id.to_string(),
        rank: checked.current.as_str().to_string(),
        multiplier: checked.current.multiplier(),
        next_rank: checked.next.map(|r| r.as_str().to_string()),
        eligible: checked.eligible(),
        unmet: checked.unmet,
        history: history.iter().map(RankRecordResponse::from).collect(),
    })
}

/// Get the current user's rank and promotion progress.
pub async fn get_my_rank(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<RankResponse>, ApiError> {
    Ok(Json(rank_status(&state, &auth.user_id).await?))
}

/// Get any learner's rank. Service-to-service only.
pub async fn get_user_rank(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(user_id): Path<String>,
) -> Result<Json<RankResponse>, ApiError> {
    let user_id = user_id
        .parse::<UserId>()
        .map_err(|_| ApiError::Validation("Invalid user id".into()))?;
    Ok(Json(rank_status(&state, &user_id).await?))
}

/// Promotion response.
#[derive(Debug, Serialize)]
pub struct PromoteResponse {
    /// The new rank record.
    pub record: RankRecordResponse,
    /// New rank multiplier.
    pub multiplier: f64,
    /// Balance after the signing bonus.
    pub balance: i64,
    /// The bonus ledger row, when the tier paid one.
    pub transaction: Option<TransactionResponse>,
}

/// Promote the current user one rank up.
pub async fn promote(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<PromoteResponse>, ApiError> {
    let outcome = ranks::promote(&state, &auth.user_id, Utc::now())?;

    Ok(Json(PromoteResponse {
        multiplier: outcome.record.rank.multiplier(),
        record: RankRecordResponse::from(&outcome.record),
        balance: outcome.state.balance,
        transaction: outcome
            .transaction
            .as_ref()
            .map(TransactionResponse::from),
    }))
}
