//! Key encoding utilities for `RocksDB`.
//!
//! UUID-keyed records use the raw 16 bytes. Index keys prepend the user id
//! so a prefix scan yields exactly one user's rows; the ULID suffix keeps
//! them time-ordered within the prefix.

use chrono::{DateTime, Utc};
use ml_rewards_core::{ExerciseId, MissionId, TransactionId, UserId};

/// Economy/rank/activity key: the raw user UUID.
#[must_use]
pub fn user_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Transaction key: the raw ULID bytes.
#[must_use]
pub fn transaction_key(transaction_id: &TransactionId) -> Vec<u8> {
    transaction_id.to_bytes().to_vec()
}

/// User-transaction index key: `user_id (16) || transaction_id (16)`.
#[must_use]
pub fn user_transaction_key(user_id: &UserId, transaction_id: &TransactionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&transaction_id.to_bytes());
    key
}

/// Mission key: the raw ULID bytes.
#[must_use]
pub fn mission_key(mission_id: &MissionId) -> Vec<u8> {
    mission_id.to_bytes().to_vec()
}

/// User-mission index key: `user_id (16) || mission_id (16)`.
#[must_use]
pub fn user_mission_key(user_id: &UserId, mission_id: &MissionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&mission_id.to_bytes());
    key
}

/// Prefix for iterating one user's index rows.
#[must_use]
pub fn user_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the ULID half of a 32-byte `user_id || ulid` index key.
///
/// Returns `None` if the key is too short.
#[must_use]
pub fn ulid_suffix(key: &[u8]) -> Option<[u8; 16]> {
    let suffix = key.get(16..32)?;
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(suffix);
    Some(bytes)
}

/// Rank history key: `user_id (16) || achieved_at millis (8, big-endian)`.
#[must_use]
pub fn rank_history_key(user_id: &UserId, achieved_at: DateTime<Utc>) -> Vec<u8> {
    let mut key = Vec::with_capacity(24);
    key.extend_from_slice(user_id.as_bytes());
    #[allow(clippy::cast_sign_loss)]
    key.extend_from_slice(&(achieved_at.timestamp_millis() as u64).to_be_bytes());
    key
}

/// Unlock key: `user_id (16) || achievement_slug (utf-8)`.
#[must_use]
pub fn unlock_key(user_id: &UserId, achievement_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(16 + achievement_id.len());
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(achievement_id.as_bytes());
    key
}

/// Latest-submission marker key: `user_id (16) || exercise_id (16)`.
#[must_use]
pub fn user_exercise_key(user_id: &UserId, exercise_id: &ExerciseId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(exercise_id.as_bytes());
    key
}

/// Submission receipt key.
#[must_use]
pub fn submission_key(submission_id: &str) -> Vec<u8> {
    submission_id.as_bytes().to_vec()
}
