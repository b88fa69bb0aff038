//! Submission handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use ml_rewards_core::{
    BonusKind, Exercise, ExerciseId, StreakChange, SubmissionMeta, SubmittedAnswers, UserId,
};

use crate::auth::ServiceAuth;
use crate::engine::orchestrator::{self, SubmissionOutcome, SubmissionRequest};
use crate::error::ApiError;
use crate::state::AppState;

/// Submission request body, sent by the exercise runner.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// The learner who submitted.
    pub user_id: UserId,
    /// Client-supplied idempotency key.
    pub submission_id: String,
    /// Snapshot of the exercise being graded.
    pub exercise: Exercise,
    /// The submitted answers.
    pub answers: SubmittedAnswers,
    /// Timing/attempt metadata.
    pub meta: SubmissionMeta,
}

/// Submission response.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    /// Echo of the idempotency key.
    pub submission_id: String,
    /// True when the exercise routes to manual grading.
    pub needs_review: bool,
    /// Raw score from the scorer.
    pub raw_score: f64,
    /// Final score after multipliers, bonuses, and penalties.
    pub final_score: u8,
    /// Whether the final score met the passing threshold.
    pub passed: bool,
    /// Coins credited.
    pub coins: i64,
    /// XP credited.
    pub xp: i64,
    /// Bonus rules that fired.
    pub bonuses: Vec<BonusKind>,
    /// Points subtracted for power-up usage.
    pub penalty: i64,
    /// Combined multiplier.
    pub multiplier: f64,
    /// What the settle did to the streak, absent for review routes.
    pub streak: Option<StreakChange>,
    /// Streak length after the settle.
    pub current_streak: u32,
    /// Coin balance after the settle.
    pub balance: i64,
    /// Lifetime XP after the settle.
    pub total_xp: i64,
    /// Mission ids this submission completed.
    pub completed_missions: Vec<String>,
    /// Achievement slugs this submission unlocked.
    pub unlocked_achievements: Vec<String>,
    /// Ranks this submission promoted the learner into.
    pub promotions: Vec<String>,
}

impl From<SubmissionOutcome> for SubmitResponse {
    fn from(outcome: SubmissionOutcome) -> Self {
        Self {
            submission_id: outcome.submission_id,
            needs_review: outcome.needs_review,
            raw_score: outcome.raw_score,
            final_score: outcome.final_score,
            passed: outcome.passed,
            coins: outcome.coins,
            xp: outcome.xp,
            bonuses: outcome.bonuses,
            penalty: outcome.penalty,
            multiplier: outcome.multiplier,
            streak: outcome.streak,
            current_streak: outcome.current_streak,
            balance: outcome.balance,
            total_xp: outcome.total_xp,
            completed_missions: outcome.completed_missions,
            unlocked_achievements: outcome.unlocked_achievements,
            promotions: outcome
                .promotions
                .iter()
                .map(|rank| rank.as_str().to_string())
                .collect(),
        }
    }
}

/// Submit a graded exercise attempt for settlement.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(exercise_id): Path<String>,
    Json(body): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let exercise_id = exercise_id
        .parse::<ExerciseId>()
        .map_err(|_| ApiError::Validation("Invalid exercise id".into()))?;

    if exercise_id != body.exercise.id {
        return Err(ApiError::Validation(
            "Path exercise id does not match submission".into(),
        ));
    }
    if body.submission_id.trim().is_empty() {
        return Err(ApiError::Validation("submission_id must not be empty".into()));
    }

    let outcome = orchestrator::process(
        &state,
        SubmissionRequest {
            user_id: body.user_id,
            submission_id: body.submission_id,
            exercise: body.exercise,
            answers: body.answers,
            meta: body.meta,
        },
    )?;

    Ok(Json(SubmitResponse::from(outcome)))
}
