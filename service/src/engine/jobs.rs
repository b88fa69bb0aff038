//! Scheduled background jobs.
//!
//! Two loops run for the lifetime of the process: mission generation at
//! each UTC midnight (weekly missions on Mondays) for recently active
//! users, and a sweep that expires overdue missions and purges finished
//! ones past retention. Both log failures and keep running.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use ml_rewards_core::MissionType;
use ml_rewards_store::Store;

use crate::engine::quests;
use crate::state::AppState;

/// How often the expiry sweep runs.
const SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(5 * 60);

/// Spawn all background jobs.
pub fn spawn(state: Arc<AppState>) {
    tokio::spawn(generation_loop(Arc::clone(&state)));
    tokio::spawn(sweep_loop(state));
}

/// Seconds until the next UTC midnight after `now`.
fn until_next_midnight(now: DateTime<Utc>) -> StdDuration {
    let next = (now.date_naive() + Duration::days(1))
        .and_time(NaiveTime::MIN)
        .and_utc();
    next.signed_duration_since(now)
        .to_std()
        .unwrap_or(StdDuration::from_secs(60))
}

async fn generation_loop(state: Arc<AppState>) {
    loop {
        tokio::time::sleep(until_next_midnight(Utc::now())).await;

        let now = Utc::now();
        let cutoff = now - Duration::days(state.config.active_user_window_days);

        let users = match state.store.active_users_since(cutoff) {
            Ok(users) => users,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list active users for mission generation");
                continue;
            }
        };

        tracing::info!(users = users.len(), "Generating scheduled missions");

        for user_id in users {
            if let Err(e) = quests::ensure_missions(&state, &user_id, MissionType::Daily, now) {
                tracing::warn!(user_id = %user_id, error = %e, "Daily mission generation failed");
            }
            if now.weekday() == Weekday::Mon {
                if let Err(e) = quests::ensure_missions(&state, &user_id, MissionType::Weekly, now)
                {
                    tracing::warn!(
                        user_id = %user_id,
                        error = %e,
                        "Weekly mission generation failed"
                    );
                }
            }
        }
    }
}

async fn sweep_loop(state: Arc<AppState>) {
    loop {
        tokio::time::sleep(SWEEP_INTERVAL).await;

        let now = Utc::now();
        match state.store.sweep_expired_missions(now) {
            Ok(0) => {}
            Ok(expired) => tracing::info!(expired, "Expired overdue missions"),
            Err(e) => tracing::error!(error = %e, "Mission expiry sweep failed"),
        }

        let cutoff = now - Duration::days(state.config.mission_retention_days);
        match state.store.purge_missions_before(cutoff) {
            Ok(0) => {}
            Ok(purged) => tracing::info!(purged, "Purged finished missions past retention"),
            Err(e) => tracing::error!(error = %e, "Mission purge failed"),
        }
    }
}
