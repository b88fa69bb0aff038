//! Mission generation.
//!
//! Daily and weekly missions are sampled from the catalog's template
//! pools per period. Generation is lazy (first fetch of the period
//! creates them) and scheduled (the background job pre-generates for
//! recently active users); both paths go through [`ensure_missions`],
//! which is idempotent per (user, cadence, period).

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use ml_rewards_core::{Mission, MissionType, UserId};
use ml_rewards_store::{Result as StoreResult, Store};
use rand::seq::SliceRandom;

use crate::state::AppState;

/// The current period window for a cadence, `[start, end)`.
///
/// Daily periods run midnight-to-midnight UTC; weekly periods run
/// Monday 00:00 UTC for seven days. Special missions have no shared
/// window and return `None`.
#[must_use]
pub fn period_window(
    mission_type: MissionType,
    now: DateTime<Utc>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    match mission_type {
        MissionType::Daily => {
            let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
            Some((start, start + Duration::days(1)))
        }
        MissionType::Weekly => {
            let monday = now.date_naive()
                - Duration::days(i64::from(now.date_naive().weekday().num_days_from_monday()));
            let start = monday.and_time(NaiveTime::MIN).and_utc();
            Some((start, start + Duration::days(7)))
        }
        MissionType::Special => None,
    }
}

/// The learner's missions for the current period of a cadence,
/// generating them if this is the first touch of the period.
///
/// For special missions this only lists what exists; they are
/// instantiated by operators, not sampled.
///
/// # Errors
///
/// Returns an error if the store fails.
pub fn ensure_missions(
    state: &Arc<AppState>,
    user_id: &UserId,
    mission_type: MissionType,
    now: DateTime<Utc>,
) -> StoreResult<Vec<Mission>> {
    let all = state.store.list_missions_by_user(user_id)?;

    let Some((start, end)) = period_window(mission_type, now) else {
        return Ok(all
            .into_iter()
            .filter(|m| m.mission_type == MissionType::Special)
            .collect());
    };

    let current: Vec<Mission> = all
        .into_iter()
        .filter(|m| m.mission_type == mission_type && m.start_date >= start && m.start_date < end)
        .collect();

    if !current.is_empty() {
        return Ok(current);
    }

    let templates = state.config.catalog.templates_for(mission_type);
    let count = state
        .config
        .catalog
        .mission_count_for(mission_type)
        .min(templates.len());

    let missions: Vec<Mission> = templates
        .choose_multiple(&mut rand::thread_rng(), count)
        .map(|template| Mission::instantiate(template, *user_id, start, end))
        .collect();

    // The store re-checks the period under its write lock, so a
    // concurrent fetch or the scheduled job cannot double-seed it.
    let stored =
        state
            .store
            .put_missions_if_absent(user_id, mission_type, start, end, &missions)?;

    if stored.first().map(|m| m.id) == missions.first().map(|m| m.id) && !stored.is_empty() {
        tracing::info!(
            user_id = %user_id,
            mission_type = mission_type.as_str(),
            count = stored.len(),
            "Generated missions for period"
        );
    }

    Ok(stored)
}
