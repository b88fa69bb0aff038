//! ML Coin ledger transactions.
//!
//! Every balance change appends one immutable [`CoinTransaction`]. Rows are
//! never updated or deleted; they form the audit trail.
//!
//! Callers build a [`TransactionDraft`] without balances; the store fills
//! in `balance_before`/`balance_after` inside its mutating critical section
//! so the recorded balances can never be stale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{TransactionId, UserId};

/// An immutable ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinTransaction {
    /// Unique transaction id (ULID, time-ordered).
    pub id: TransactionId,

    /// The learner whose balance changed.
    pub user_id: UserId,

    /// Signed amount. Positive = earn, negative = spend.
    pub amount: i64,

    /// What caused the change.
    pub transaction_type: TransactionType,

    /// Balance before this transaction.
    pub balance_before: i64,

    /// Balance after this transaction. Always `balance_before + amount`.
    pub balance_after: i64,

    /// Human-readable reason.
    pub reason: String,

    /// Optional reference to the triggering entity (exercise, mission,
    /// achievement slug, rank name, ...).
    pub reference_id: Option<String>,

    /// Combined multiplier applied when earning, if any.
    pub multiplier: Option<f64>,

    /// When the transaction was created.
    pub created_at: DateTime<Utc>,
}

/// A transaction with everything except the balances.
///
/// Amounts are unsigned magnitudes here; the sign is derived from the
/// transaction type when the draft is finalized.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    /// The learner to credit or debit.
    pub user_id: UserId,

    /// Magnitude of the change (non-negative).
    pub amount: i64,

    /// What caused the change.
    pub transaction_type: TransactionType,

    /// Human-readable reason.
    pub reason: String,

    /// Optional reference to the triggering entity.
    pub reference_id: Option<String>,

    /// Combined multiplier applied when earning, if any.
    pub multiplier: Option<f64>,
}

impl TransactionDraft {
    /// Draft an earn of `amount` coins.
    #[must_use]
    pub fn earn(
        user_id: UserId,
        amount: i64,
        transaction_type: TransactionType,
        reason: impl Into<String>,
    ) -> Self {
        debug_assert!(transaction_type.is_credit());
        Self {
            user_id,
            amount: amount.abs(),
            transaction_type,
            reason: reason.into(),
            reference_id: None,
            multiplier: None,
        }
    }

    /// Draft a spend of `amount` coins.
    #[must_use]
    pub fn spend(user_id: UserId, amount: i64, reason: impl Into<String>) -> Self {
        Self {
            user_id,
            amount: amount.abs(),
            transaction_type: TransactionType::SpentPowerup,
            reason: reason.into(),
            reference_id: None,
            multiplier: None,
        }
    }

    /// Attach a reference to the triggering entity.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference_id = Some(reference.into());
        self
    }

    /// Record the multiplier that produced the amount.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// The signed delta this draft applies to a balance.
    #[must_use]
    pub fn signed_amount(&self) -> i64 {
        if self.transaction_type.is_debit() {
            -self.amount
        } else {
            self.amount
        }
    }

    /// Finalize into a full transaction given the balance read inside the
    /// store's critical section.
    #[must_use]
    pub fn finalize(&self, balance_before: i64, now: DateTime<Utc>) -> CoinTransaction {
        let amount = self.signed_amount();
        CoinTransaction {
            id: TransactionId::generate(),
            user_id: self.user_id,
            amount,
            transaction_type: self.transaction_type,
            balance_before,
            balance_after: balance_before + amount,
            reason: self.reason.clone(),
            reference_id: self.reference_id.clone(),
            multiplier: self.multiplier,
            created_at: now,
        }
    }
}

/// What caused a balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Reward for a settled exercise submission.
    EarnedExercise,

    /// Streak milestone reward.
    EarnedStreak,

    /// Achievement unlock reward.
    EarnedAchievement,

    /// Rank promotion signing bonus.
    EarnedRank,

    /// Mission claim reward.
    EarnedMission,

    /// Coins spent on a power-up or shop item.
    SpentPowerup,

    /// Manual adjustment by an administrator (may be either direction,
    /// but is treated as a credit here; negative adjustments go through
    /// the spend path).
    AdminAdjustment,
}

impl TransactionType {
    /// Whether this type adds coins.
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(
            self,
            Self::EarnedExercise
                | Self::EarnedStreak
                | Self::EarnedAchievement
                | Self::EarnedRank
                | Self::EarnedMission
                | Self::AdminAdjustment
        )
    }

    /// Whether this type removes coins.
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        matches!(self, Self::SpentPowerup)
    }
}
