//! Streak arithmetic.
//!
//! The write path compares calendar days (UTC); the read path additionally
//! treats a streak as expired once more than [`STREAK_EXPIRY_HOURS`] have
//! passed since the last activity, without mutating anything. Both paths
//! share the same constant so the displayed and stored streak never
//! disagree about when a streak dies.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Hours after which an untouched streak reads as zero.
pub const STREAK_EXPIRY_HOURS: i64 = 24;

/// What a [`advance`] call did to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    /// First ever activity; streak started at 1.
    Started,
    /// Activity on the next calendar day; streak grew.
    Extended,
    /// Another activity on the same day; nothing changed.
    Unchanged,
    /// A gap of more than one day; streak reset to 1.
    Reset,
}

/// Advance a streak for an activity at `now`.
///
/// Returns the new `(current, best, change)`.
#[must_use]
pub fn advance(
    current: u32,
    best: u32,
    last_activity: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (u32, u32, StreakChange) {
    let Some(last) = last_activity else {
        return (1, best.max(1), StreakChange::Started);
    };

    let days_apart = now
        .date_naive()
        .signed_duration_since(last.date_naive())
        .num_days();

    match days_apart {
        0 => (current, best, StreakChange::Unchanged),
        1 => {
            let grown = current + 1;
            (grown, best.max(grown), StreakChange::Extended)
        }
        _ => (1, best.max(1), StreakChange::Reset),
    }
}

/// The streak as it should be reported at read time: zero once more than
/// 24 hours have elapsed since the last activity.
#[must_use]
pub fn effective_streak(current: u32, last_activity: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u32 {
    match last_activity {
        Some(last) if now.signed_duration_since(last) <= Duration::hours(STREAK_EXPIRY_HOURS) => {
            current
        }
        _ => 0,
    }
}
