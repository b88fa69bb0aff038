//! Coin balance, ledger, and spend handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use ml_rewards_core::{
    streak, ActionType, CoinTransaction, EconomyState, TransactionDraft, TransactionType, UserId,
};
use ml_rewards_store::Store;

use crate::auth::{AdminAuth, AuthUser};
use crate::engine::{events, ranks};
use crate::error::ApiError;
use crate::state::AppState;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// User ID.
    pub user_id: String,
    /// Current ML Coin balance.
    pub balance: i64,
    /// Lifetime coins earned.
    pub earned_total: i64,
    /// Lifetime coins spent.
    pub spent_total: i64,
    /// Coins earned today (UTC).
    pub earned_today: i64,
    /// Lifetime XP.
    pub total_xp: i64,
    /// Streak as it stands right now (zero once expired).
    pub current_streak: u32,
    /// Best streak ever reached.
    pub best_streak: u32,
    /// Current rank name.
    pub rank: String,
    /// Current rank multiplier.
    pub rank_multiplier: f64,
}

/// Get the current user's balance and progression summary.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let now = Utc::now();
    let economy = state
        .store
        .get_economy(&auth.user_id)?
        .unwrap_or_else(|| EconomyState::new(auth.user_id));
    let rank = ranks::held_rank(&state, &auth.user_id)?;

    // earned_today may refer to an older day if nothing was earned yet
    // today; report zero in that case.
    let earned_today = if economy.earned_today_on == now.date_naive() {
        economy.earned_today
    } else {
        0
    };

    Ok(Json(BalanceResponse {
        user_id: auth.user_id.to_string(),
        balance: economy.balance,
        earned_total: economy.earned_total,
        spent_total: economy.spent_total,
        earned_today,
        total_xp: economy.total_xp,
        current_streak: streak::effective_streak(
            economy.current_streak,
            economy.last_activity_at,
            now,
        ),
        best_streak: economy.best_streak,
        rank: rank.as_str().to_string(),
        rank_multiplier: rank.multiplier(),
    }))
}

/// Transaction list query parameters.
#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    /// Maximum number of transactions to return.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Number of transactions to skip.
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// A single ledger row.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: String,
    /// Signed amount. Positive = earn, negative = spend.
    pub amount: i64,
    /// What caused the change.
    pub transaction_type: TransactionType,
    /// Balance before this transaction.
    pub balance_before: i64,
    /// Balance after this transaction.
    pub balance_after: i64,
    /// Human-readable reason.
    pub reason: String,
    /// Reference to the triggering entity, if any.
    pub reference_id: Option<String>,
    /// Multiplier applied when earning, if any.
    pub multiplier: Option<f64>,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&CoinTransaction> for TransactionResponse {
    fn from(tx: &CoinTransaction) -> Self {
        Self {
            id: tx.id.to_string(),
            amount: tx.amount,
            transaction_type: tx.transaction_type,
            balance_before: tx.balance_before,
            balance_after: tx.balance_after,
            reason: tx.reason.clone(),
            reference_id: tx.reference_id.clone(),
            multiplier: tx.multiplier,
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// Transaction list response.
#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    /// The transactions, newest first.
    pub transactions: Vec<TransactionResponse>,
    /// Whether more rows exist past this page.
    pub has_more: bool,
}

/// List the current user's ledger, newest first.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let limit = query.limit.min(100);

    // Fetch one extra row to detect whether more pages exist.
    let mut rows = state
        .store
        .list_transactions_by_user(&auth.user_id, limit + 1, query.offset)?;

    let has_more = rows.len() > limit;
    rows.truncate(limit);

    Ok(Json(TransactionListResponse {
        transactions: rows.iter().map(TransactionResponse::from).collect(),
        has_more,
    }))
}

/// Spend request.
#[derive(Debug, Deserialize)]
pub struct SpendRequest {
    /// Coins to spend. Must be positive.
    pub amount: i64,
    /// What the coins are spent on.
    pub reason: String,
    /// Optional reference to the purchased item.
    pub reference_id: Option<String>,
}

/// Spend response.
#[derive(Debug, Serialize)]
pub struct SpendResponse {
    /// Balance after the spend.
    pub balance: i64,
    /// The ledger row.
    pub transaction: TransactionResponse,
}

/// Spend coins from the current user's balance.
pub async fn spend(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<SpendRequest>,
) -> Result<Json<SpendResponse>, ApiError> {
    if body.amount <= 0 {
        return Err(ApiError::Validation("amount must be positive".into()));
    }
    if body.reason.trim().is_empty() {
        return Err(ApiError::Validation("reason must not be empty".into()));
    }

    let mut draft = TransactionDraft::spend(auth.user_id, body.amount, body.reason);
    if let Some(reference) = body.reference_id {
        draft = draft.with_reference(reference);
    }

    let entry = state.store.debit(&draft)?;

    tracing::info!(
        user_id = %auth.user_id,
        amount = body.amount,
        balance = entry.state.balance,
        "Coins spent"
    );

    events::record_actions(
        &state,
        &auth.user_id,
        &[(ActionType::SpendCoins, body.amount)],
        Utc::now(),
    );

    Ok(Json(SpendResponse {
        balance: entry.state.balance,
        transaction: TransactionResponse::from(&entry.transaction),
    }))
}

/// Admin grant request.
#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    /// The learner to credit.
    pub user_id: UserId,
    /// Coins to grant. Must be positive.
    pub amount: i64,
    /// XP to grant alongside, if any.
    #[serde(default)]
    pub xp: i64,
    /// Audit reason.
    pub reason: String,
}

/// Grant coins (and optionally XP) to a learner. Admin only.
pub async fn grant(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(body): Json<GrantRequest>,
) -> Result<Json<SpendResponse>, ApiError> {
    if body.amount <= 0 {
        return Err(ApiError::Validation("amount must be positive".into()));
    }
    if body.xp < 0 {
        return Err(ApiError::Validation("xp must not be negative".into()));
    }

    let draft = TransactionDraft::earn(
        body.user_id,
        body.amount,
        TransactionType::AdminAdjustment,
        body.reason,
    )
    .with_reference(format!("admin:{}", admin.admin_id));

    let entry = state.store.credit(&draft, body.xp)?;

    tracing::info!(
        admin_id = %admin.admin_id,
        user_id = %body.user_id,
        amount = body.amount,
        xp = body.xp,
        "Admin grant applied"
    );

    Ok(Json(SpendResponse {
        balance: entry.state.balance,
        transaction: TransactionResponse::from(&entry.transaction),
    }))
}
