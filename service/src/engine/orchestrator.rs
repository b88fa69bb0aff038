//! The submission pipeline.
//!
//! One settled submission flows: guards (duplicate, rate limit, timing)
//! → score → reward computation → atomic settle → side effects. The
//! settle is the only step that must not fail; everything after it is
//! best-effort and isolated.

use std::sync::Arc;

use chrono::Utc;
use ml_rewards_core::{
    reward, scoring, streak, ActionType, BonusKind, Exercise, Rank, RewardInputs, StreakChange,
    SubmissionMeta, SubmittedAnswers, TransactionDraft, TransactionType, UserId,
};
use ml_rewards_store::{Settlement, StatsDelta, Store, SubmissionReceipt};

use crate::engine::{achievements, events, ranks};
use crate::error::ApiError;
use crate::notify::{self, OutboundEvent};
use crate::state::AppState;

/// One submission, as received from the exercise runner.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
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

/// Everything the pipeline produced for one submission.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    /// Echo of the idempotency key.
    pub submission_id: String,
    /// True when the exercise routes to manual grading; nothing was
    /// credited and no receipt was written.
    pub needs_review: bool,
    /// Raw score from the scorer.
    pub raw_score: f64,
    /// Final score after multipliers, bonuses, and penalties.
    pub final_score: u8,
    /// Whether the final score met the exercise's passing threshold.
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
    pub promotions: Vec<Rank>,
}

/// Run one submission through the full pipeline.
///
/// # Errors
///
/// - [`ApiError::DuplicateSubmission`] when the submission id already
///   settled.
/// - [`ApiError::RateLimited`] inside the per-(user, exercise) window.
/// - [`ApiError::SubmissionTooFast`] / [`ApiError::SessionExpired`] on
///   implausible timing.
/// - [`ApiError::Validation`] when the answer shape does not match the
///   exercise type.
pub fn process(
    state: &Arc<AppState>,
    request: SubmissionRequest,
) -> Result<SubmissionOutcome, ApiError> {
    let now = Utc::now();
    let user_id = request.user_id;
    let exercise = &request.exercise;

    if state.store.has_submission(&request.submission_id)? {
        return Err(ApiError::DuplicateSubmission(request.submission_id));
    }

    if let Some(last) = state.store.last_submission_at(&user_id, &exercise.id)? {
        let elapsed = now.signed_duration_since(last).num_seconds().max(0);
        let window = i64::try_from(state.config.submission_window_seconds).unwrap_or(i64::MAX);
        if elapsed < window {
            let retry_after = u64::try_from(window - elapsed).unwrap_or(1).max(1);
            return Err(ApiError::RateLimited { retry_after });
        }
    }

    if request.meta.time_spent_seconds < state.config.min_submission_seconds {
        return Err(ApiError::SubmissionTooFast);
    }
    if request.meta.time_spent_seconds > state.config.max_session_seconds {
        return Err(ApiError::SessionExpired);
    }

    let score = scoring::score(&exercise.content, &request.answers)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    if score.needs_review {
        tracing::info!(
            user_id = %user_id,
            exercise_id = %exercise.id,
            "Submission routed to manual review"
        );
        return Ok(SubmissionOutcome {
            submission_id: request.submission_id,
            needs_review: true,
            raw_score: score.percent,
            final_score: 0,
            passed: false,
            coins: 0,
            xp: 0,
            bonuses: Vec::new(),
            penalty: 0,
            multiplier: 1.0,
            streak: None,
            current_streak: 0,
            balance: 0,
            total_xp: 0,
            completed_missions: Vec::new(),
            unlocked_achievements: Vec::new(),
            promotions: Vec::new(),
        });
    }

    let rank = ranks::held_rank(state, &user_id)?;
    let economy = state.store.get_economy(&user_id)?;
    let streak_days = economy.as_ref().map_or(0, |e| {
        streak::effective_streak(e.current_streak, e.last_activity_at, now)
    });

    let breakdown = reward::compute(&RewardInputs {
        raw_score: score.percent,
        difficulty: exercise.difficulty,
        rank_multiplier: rank.multiplier(),
        streak_days,
        estimated_seconds: exercise.estimated_seconds,
        meta: request.meta.clone(),
        coin_reward: exercise.coin_reward,
        xp_reward: exercise.xp_reward,
    });

    let passed = breakdown.final_score >= exercise.passing_score;
    let first_attempt_pass = passed && request.meta.attempt <= 1;

    let draft = TransactionDraft::earn(
        user_id,
        breakdown.coins,
        TransactionType::EarnedExercise,
        format!("Exercise completed: {}%", breakdown.final_score),
    )
    .with_reference(exercise.id.to_string())
    .with_multiplier(breakdown.multiplier);

    let settlement = Settlement {
        receipt: SubmissionReceipt {
            submission_id: request.submission_id.clone(),
            user_id,
            exercise_id: exercise.id,
            raw_score: score.percent,
            final_score: breakdown.final_score,
            settled_at: now,
        },
        draft,
        xp: breakdown.xp,
        stats: StatsDelta {
            exercises_completed: 1,
            perfect_scores: u64::from(breakdown.is_perfect),
            first_attempt_passes: u64::from(first_attempt_pass),
            modules_completed: 0,
            score: Some(breakdown.final_score),
        },
    };

    let settled = state.store.settle_submission(&settlement)?;

    tracing::info!(
        user_id = %user_id,
        exercise_id = %exercise.id,
        final_score = breakdown.final_score,
        coins = breakdown.coins,
        xp = breakdown.xp,
        streak = ?settled.streak,
        "Submission settled"
    );

    // Side effects past this point are best-effort.
    let mut actions = vec![(ActionType::CompleteExercises, 1)];
    if breakdown.is_perfect {
        actions.push((ActionType::PerfectScores, 1));
    }
    if breakdown.coins > 0 {
        actions.push((ActionType::EarnCoins, breakdown.coins));
    }
    if breakdown.xp > 0 {
        actions.push((ActionType::EarnXp, breakdown.xp));
    }
    if first_attempt_pass {
        actions.push((ActionType::FirstAttemptPasses, 1));
    }
    if breakdown.bonuses.contains(&BonusKind::SpeedRun) {
        actions.push((ActionType::SpeedRuns, 1));
    }
    if request.meta.powerups_used == 0 {
        actions.push((ActionType::NoPowerupCompletions, 1));
    }
    actions.push((
        ActionType::MaintainStreak,
        i64::from(settled.state.current_streak),
    ));
    if settled.streak != StreakChange::Unchanged {
        actions.push((ActionType::DailyLogin, 1));
    }

    let completed = events::record_actions(state, &user_id, &actions, now);
    let unlocked = achievements::evaluate(state, &user_id, now);
    let promotions = ranks::auto_check(state, &user_id, now);

    if breakdown.coins > 0 {
        notify::send(
            &state.notifier,
            OutboundEvent::new(
                "coins_earned",
                user_id,
                serde_json::json!({
                    "amount": breakdown.coins,
                    "balance": settled.state.balance,
                    "reference": exercise.id.to_string(),
                }),
            ),
        );
    }
    if breakdown.xp > 0 {
        notify::send(
            &state.notifier,
            OutboundEvent::new(
                "xp_earned",
                user_id,
                serde_json::json!({
                    "amount": breakdown.xp,
                    "total_xp": settled.state.total_xp,
                }),
            ),
        );
    }
    if matches!(settled.streak, StreakChange::Started | StreakChange::Extended) {
        notify::send(
            &state.notifier,
            OutboundEvent::new(
                "streak_extended",
                user_id,
                serde_json::json!({
                    "current_streak": settled.state.current_streak,
                    "best_streak": settled.state.best_streak,
                }),
            ),
        );
    }

    Ok(SubmissionOutcome {
        submission_id: request.submission_id,
        needs_review: false,
        raw_score: score.percent,
        final_score: breakdown.final_score,
        passed,
        coins: breakdown.coins,
        xp: breakdown.xp,
        bonuses: breakdown.bonuses,
        penalty: breakdown.penalty,
        multiplier: breakdown.multiplier,
        streak: Some(settled.streak),
        current_streak: settled.state.current_streak,
        balance: settled.state.balance,
        total_xp: settled.state.total_xp,
        completed_missions: completed.iter().map(|m| m.id.to_string()).collect(),
        unlocked_achievements: unlocked
            .iter()
            .map(|o| o.unlock.achievement_id.clone())
            .collect(),
        promotions: promotions.iter().map(|p| p.record.rank).collect(),
    })
}
