//! `RocksDB` storage implementation.
//!
//! All mutating operations serialize through one internal write lock and
//! land in a single `WriteBatch`, so every read-modify-write (balance
//! updates, streak advances, mission progress) is atomic with the ledger
//! rows it produces.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use ml_rewards_core::{
    streak, AchievementDef, ActionType, CoinTransaction, EconomyState, ExerciseId, Mission,
    MissionId, MissionStatus, MissionType, Rank, RankRecord, TransactionDraft, TransactionId,
    TransactionType, UserAchievement, UserId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{
    ClaimOutcome, LedgerEntry, PromotionOutcome, Settlement, SettlementOutcome, Store,
    SubmissionReceipt, UnlockOutcome,
};

/// `RocksDB`-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Take the write lock guarding all read-modify-write operations.
    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Database("write lock poisoned".into()))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// The economy record, or a fresh zero state if none exists yet.
    fn get_or_new_economy(&self, user_id: &UserId) -> Result<EconomyState> {
        Ok(self
            .get_economy(user_id)?
            .unwrap_or_else(|| EconomyState::new(*user_id)))
    }

    /// Stage an economy write.
    fn stage_economy(&self, batch: &mut WriteBatch, state: &EconomyState) -> Result<()> {
        let cf = self.cf(cf::ECONOMY)?;
        batch.put_cf(&cf, keys::user_key(&state.user_id), Self::serialize(state)?);
        Ok(())
    }

    /// Stage a ledger row plus its user index entry.
    fn stage_transaction(&self, batch: &mut WriteBatch, tx: &CoinTransaction) -> Result<()> {
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;
        batch.put_cf(&cf_tx, keys::transaction_key(&tx.id), Self::serialize(tx)?);
        batch.put_cf(&cf_by_user, keys::user_transaction_key(&tx.user_id, &tx.id), []);
        Ok(())
    }

    /// Stage a mission write plus its user index entry.
    fn stage_mission(&self, batch: &mut WriteBatch, mission: &Mission) -> Result<()> {
        let cf_missions = self.cf(cf::MISSIONS)?;
        let cf_by_user = self.cf(cf::MISSIONS_BY_USER)?;
        batch.put_cf(
            &cf_missions,
            keys::mission_key(&mission.id),
            Self::serialize(mission)?,
        );
        batch.put_cf(
            &cf_by_user,
            keys::user_mission_key(&mission.user_id, &mission.id),
            [],
        );
        Ok(())
    }

    /// Stage the activity marker.
    fn stage_activity(
        &self,
        batch: &mut WriteBatch,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let cf = self.cf(cf::ACTIVITY)?;
        batch.put_cf(&cf, keys::user_key(user_id), Self::serialize(&at)?);
        Ok(())
    }

    /// Credit a draft against `state`, staging the ledger row. The caller
    /// holds the write lock.
    fn stage_credit(
        &self,
        batch: &mut WriteBatch,
        state: &mut EconomyState,
        draft: &TransactionDraft,
        now: DateTime<Utc>,
    ) -> Result<CoinTransaction> {
        let balance_before = state.balance;
        state.apply_earn(draft.amount, now);
        let tx = draft.finalize(balance_before, now);
        self.stage_transaction(batch, &tx)?;
        Ok(tx)
    }

    /// Every mission instance in the database. Used by the sweeps.
    fn scan_missions(&self) -> Result<Vec<Mission>> {
        let cf = self.cf(cf::MISSIONS)?;
        let mut missions = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            missions.push(Self::deserialize(&value)?);
        }
        Ok(missions)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Economy Operations
    // =========================================================================

    fn put_economy(&self, state: &EconomyState) -> Result<()> {
        let cf = self.cf(cf::ECONOMY)?;
        self.db
            .put_cf(&cf, keys::user_key(&state.user_id), Self::serialize(state)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_economy(&self, user_id: &UserId) -> Result<Option<EconomyState>> {
        let cf = self.cf(cf::ECONOMY)?;
        self.db
            .get_cf(&cf, keys::user_key(user_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn credit(&self, draft: &TransactionDraft, xp: i64) -> Result<LedgerEntry> {
        let _guard = self.lock()?;
        let now = Utc::now();
        let mut state = self.get_or_new_economy(&draft.user_id)?;

        let mut batch = WriteBatch::default();
        let tx = self.stage_credit(&mut batch, &mut state, draft, now)?;
        if xp > 0 {
            state.apply_xp(xp, now);
        }
        self.stage_economy(&mut batch, &state)?;
        self.write(batch)?;

        Ok(LedgerEntry {
            state,
            transaction: tx,
        })
    }

    fn debit(&self, draft: &TransactionDraft) -> Result<LedgerEntry> {
        let _guard = self.lock()?;
        let now = Utc::now();
        let mut state = self
            .get_economy(&draft.user_id)?
            .ok_or(StoreError::InsufficientFunds {
                balance: 0,
                required: draft.amount,
            })?;

        if !state.can_spend(draft.amount) {
            return Err(StoreError::InsufficientFunds {
                balance: state.balance,
                required: draft.amount,
            });
        }

        let balance_before = state.balance;
        state.apply_spend(draft.amount, now);
        let tx = draft.finalize(balance_before, now);

        let mut batch = WriteBatch::default();
        self.stage_transaction(&mut batch, &tx)?;
        self.stage_economy(&mut batch, &state)?;
        self.write(batch)?;

        Ok(LedgerEntry {
            state,
            transaction: tx,
        })
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<CoinTransaction>> {
        let cf = self.cf(cf::TRANSACTIONS)?;
        self.db
            .get_cf(&cf, keys::transaction_key(transaction_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CoinTransaction>> {
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;
        let prefix = keys::user_prefix(user_id);

        // ULIDs sort ascending by creation time; collect the user's index
        // keys and reverse for newest-first.
        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            all_keys.push(key.to_vec());
        }
        all_keys.reverse();

        let mut transactions = Vec::new();
        for key in all_keys.into_iter().skip(offset) {
            if transactions.len() >= limit {
                break;
            }
            let Some(bytes) = keys::ulid_suffix(&key) else {
                continue;
            };
            if let Some(tx) = self.get_transaction(&TransactionId::from_bytes(bytes))? {
                transactions.push(tx);
            }
        }

        Ok(transactions)
    }

    // =========================================================================
    // Submission Operations
    // =========================================================================

    fn settle_submission(&self, settlement: &Settlement) -> Result<SettlementOutcome> {
        let receipt = &settlement.receipt;
        let now = receipt.settled_at;

        let _guard = self.lock()?;
        if self.has_submission(&receipt.submission_id)? {
            return Err(StoreError::DuplicateSubmission {
                submission_id: receipt.submission_id.clone(),
            });
        }

        let mut state = self.get_or_new_economy(&receipt.user_id)?;

        let (current, best, change) = streak::advance(
            state.current_streak,
            state.best_streak,
            state.last_activity_at,
            now,
        );
        state.current_streak = current;
        state.best_streak = best;
        state.last_activity_at = Some(now);

        let mut batch = WriteBatch::default();
        let transaction = if settlement.draft.amount > 0 {
            Some(self.stage_credit(&mut batch, &mut state, &settlement.draft, now)?)
        } else {
            None
        };
        if settlement.xp > 0 {
            state.apply_xp(settlement.xp, now);
        }
        settlement.stats.apply_to(&mut state.stats);
        state.updated_at = now;
        self.stage_economy(&mut batch, &state)?;

        let cf_submissions = self.cf(cf::SUBMISSIONS)?;
        let cf_latest = self.cf(cf::SUBMISSION_LATEST)?;
        batch.put_cf(
            &cf_submissions,
            keys::submission_key(&receipt.submission_id),
            Self::serialize(receipt)?,
        );
        batch.put_cf(
            &cf_latest,
            keys::user_exercise_key(&receipt.user_id, &receipt.exercise_id),
            Self::serialize(&now)?,
        );
        self.stage_activity(&mut batch, &receipt.user_id, now)?;
        self.write(batch)?;

        Ok(SettlementOutcome {
            state,
            transaction,
            streak: change,
        })
    }

    fn has_submission(&self, submission_id: &str) -> Result<bool> {
        let cf = self.cf(cf::SUBMISSIONS)?;
        Ok(self
            .db
            .get_cf(&cf, keys::submission_key(submission_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some())
    }

    fn last_submission_at(
        &self,
        user_id: &UserId,
        exercise_id: &ExerciseId,
    ) -> Result<Option<DateTime<Utc>>> {
        let cf = self.cf(cf::SUBMISSION_LATEST)?;
        self.db
            .get_cf(&cf, keys::user_exercise_key(user_id, exercise_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    // =========================================================================
    // Activity Operations
    // =========================================================================

    fn log_activity(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<()> {
        let cf = self.cf(cf::ACTIVITY)?;
        self.db
            .put_cf(&cf, keys::user_key(user_id), Self::serialize(&at)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn active_users_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<UserId>> {
        let cf = self.cf(cf::ACTIVITY)?;
        let mut users = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let at: DateTime<Utc> = Self::deserialize(&value)?;
            if at < cutoff {
                continue;
            }
            if let Ok(bytes) = <[u8; 16]>::try_from(key.as_ref()) {
                users.push(UserId::from_bytes(bytes));
            }
        }
        Ok(users)
    }

    // =========================================================================
    // Rank Operations
    // =========================================================================

    fn current_rank(&self, user_id: &UserId) -> Result<Option<RankRecord>> {
        let cf = self.cf(cf::RANK_CURRENT)?;
        self.db
            .get_cf(&cf, keys::user_key(user_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn rank_history(&self, user_id: &UserId) -> Result<Vec<RankRecord>> {
        let cf = self.cf(cf::RANK_HISTORY)?;
        let prefix = keys::user_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        let mut records = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            records.push(Self::deserialize(&value)?);
        }
        Ok(records)
    }

    fn promote(&self, record: &RankRecord) -> Result<PromotionOutcome> {
        let _guard = self.lock()?;
        let current = self.current_rank(&record.user_id)?;
        let held = current.as_ref().map_or(Rank::Nacom, |r| r.rank);
        if record.previous_rank != Some(held) {
            return Err(StoreError::RankConflict);
        }

        let cf_current = self.cf(cf::RANK_CURRENT)?;
        let cf_history = self.cf(cf::RANK_HISTORY)?;
        let mut batch = WriteBatch::default();

        // Demote the outgoing record in the history.
        if let Some(mut outgoing) = current {
            outgoing.is_current = false;
            batch.put_cf(
                &cf_history,
                keys::rank_history_key(&outgoing.user_id, outgoing.achieved_at),
                Self::serialize(&outgoing)?,
            );
        }

        batch.put_cf(
            &cf_current,
            keys::user_key(&record.user_id),
            Self::serialize(record)?,
        );
        batch.put_cf(
            &cf_history,
            keys::rank_history_key(&record.user_id, record.achieved_at),
            Self::serialize(record)?,
        );

        let mut state = self.get_or_new_economy(&record.user_id)?;
        let transaction = if record.bonus_coins > 0 {
            let draft = TransactionDraft::earn(
                record.user_id,
                record.bonus_coins,
                TransactionType::EarnedRank,
                format!("Rank promotion: {}", record.rank),
            )
            .with_reference(record.rank.as_str());
            Some(self.stage_credit(&mut batch, &mut state, &draft, record.achieved_at)?)
        } else {
            None
        };
        self.stage_economy(&mut batch, &state)?;
        self.write(batch)?;

        Ok(PromotionOutcome {
            record: record.clone(),
            state,
            transaction,
        })
    }

    // =========================================================================
    // Mission Operations
    // =========================================================================

    fn put_missions(&self, missions: &[Mission]) -> Result<()> {
        let mut batch = WriteBatch::default();
        for mission in missions {
            self.stage_mission(&mut batch, mission)?;
        }
        self.write(batch)
    }

    fn put_missions_if_absent(
        &self,
        user_id: &UserId,
        mission_type: MissionType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        missions: &[Mission],
    ) -> Result<Vec<Mission>> {
        let _guard = self.lock()?;

        // Re-check the period inside the critical section; a concurrent
        // caller may have seeded it between the caller's read and here.
        let existing: Vec<Mission> = self
            .list_missions_by_user(user_id)?
            .into_iter()
            .filter(|m| {
                m.mission_type == mission_type && m.start_date >= start && m.start_date < end
            })
            .collect();
        if !existing.is_empty() {
            return Ok(existing);
        }

        let mut batch = WriteBatch::default();
        for mission in missions {
            self.stage_mission(&mut batch, mission)?;
        }
        self.write(batch)?;
        Ok(missions.to_vec())
    }

    fn get_mission(&self, mission_id: &MissionId) -> Result<Option<Mission>> {
        let cf = self.cf(cf::MISSIONS)?;
        self.db
            .get_cf(&cf, keys::mission_key(mission_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_missions_by_user(&self, user_id: &UserId) -> Result<Vec<Mission>> {
        let cf_by_user = self.cf(cf::MISSIONS_BY_USER)?;
        let prefix = keys::user_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        let mut missions = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            let Some(bytes) = keys::ulid_suffix(&key) else {
                continue;
            };
            if let Some(mission) = self.get_mission(&MissionId::from_bytes(bytes))? {
                missions.push(mission);
            }
        }
        Ok(missions)
    }

    fn apply_mission_action(
        &self,
        user_id: &UserId,
        action: ActionType,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Mission>> {
        let _guard = self.lock()?;
        let mut batch = WriteBatch::default();
        let mut completed = Vec::new();

        for mut mission in self.list_missions_by_user(user_id)? {
            if !mission.status.accepts_progress() {
                continue;
            }
            if mission.is_expired_at(now) {
                mission.expire();
                self.stage_mission(&mut batch, &mission)?;
                continue;
            }
            let finished = mission.apply_action(action, amount, now);
            self.stage_mission(&mut batch, &mission)?;
            if finished {
                completed.push(mission);
            }
        }

        self.write(batch)?;
        Ok(completed)
    }

    fn claim_mission(
        &self,
        user_id: &UserId,
        mission_id: &MissionId,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome> {
        let _guard = self.lock()?;
        let mut mission = self.get_mission(mission_id)?.ok_or(StoreError::NotFound)?;
        if mission.user_id != *user_id {
            return Err(StoreError::NotFound);
        }
        match mission.status {
            MissionStatus::Claimed => return Err(StoreError::AlreadyClaimed),
            MissionStatus::Completed => {}
            _ => return Err(StoreError::MissionNotCompleted),
        }

        mission.status = MissionStatus::Claimed;
        mission.claimed_at = Some(now);

        let mut batch = WriteBatch::default();
        self.stage_mission(&mut batch, &mission)?;

        let mut state = self.get_or_new_economy(user_id)?;
        let transaction = if mission.rewards.coins > 0 {
            let draft = TransactionDraft::earn(
                *user_id,
                mission.rewards.coins,
                TransactionType::EarnedMission,
                format!("Mission: {}", mission.title),
            )
            .with_reference(mission.id.to_string());
            Some(self.stage_credit(&mut batch, &mut state, &draft, now)?)
        } else {
            None
        };
        if mission.rewards.xp > 0 {
            state.apply_xp(mission.rewards.xp, now);
        }
        state.stats.missions_claimed += 1;
        state.updated_at = now;
        self.stage_economy(&mut batch, &state)?;
        self.stage_activity(&mut batch, user_id, now)?;
        self.write(batch)?;

        Ok(ClaimOutcome {
            mission,
            state,
            transaction,
        })
    }

    fn sweep_expired_missions(&self, now: DateTime<Utc>) -> Result<u64> {
        let _guard = self.lock()?;
        let mut batch = WriteBatch::default();
        let mut expired = 0u64;

        for mut mission in self.scan_missions()? {
            if mission.is_expired_at(now) {
                mission.expire();
                self.stage_mission(&mut batch, &mission)?;
                expired += 1;
            }
        }

        self.write(batch)?;
        Ok(expired)
    }

    fn purge_missions_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let _guard = self.lock()?;
        let cf_missions = self.cf(cf::MISSIONS)?;
        let cf_by_user = self.cf(cf::MISSIONS_BY_USER)?;
        let mut batch = WriteBatch::default();
        let mut purged = 0u64;

        for mission in self.scan_missions()? {
            let finished = matches!(
                mission.status,
                MissionStatus::Expired | MissionStatus::Claimed
            );
            if finished && mission.end_date < cutoff {
                batch.delete_cf(&cf_missions, keys::mission_key(&mission.id));
                batch.delete_cf(
                    &cf_by_user,
                    keys::user_mission_key(&mission.user_id, &mission.id),
                );
                purged += 1;
            }
        }

        self.write(batch)?;
        Ok(purged)
    }

    // =========================================================================
    // Achievement Operations
    // =========================================================================

    fn unlock_achievement(
        &self,
        user_id: &UserId,
        def: &AchievementDef,
        now: DateTime<Utc>,
    ) -> Result<Option<UnlockOutcome>> {
        let _guard = self.lock()?;
        let cf_unlocks = self.cf(cf::UNLOCKS)?;
        let key = keys::unlock_key(user_id, &def.id);

        let exists = self
            .db
            .get_cf(&cf_unlocks, &key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();
        if exists {
            return Ok(None);
        }

        let unlock = UserAchievement {
            user_id: *user_id,
            achievement_id: def.id.clone(),
            unlocked_at: now,
        };

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_unlocks, &key, Self::serialize(&unlock)?);

        let mut state = self.get_or_new_economy(user_id)?;
        let transaction = if def.rewards.coins > 0 {
            let draft = TransactionDraft::earn(
                *user_id,
                def.rewards.coins,
                TransactionType::EarnedAchievement,
                format!("Achievement: {}", def.name),
            )
            .with_reference(def.id.clone());
            Some(self.stage_credit(&mut batch, &mut state, &draft, now)?)
        } else {
            None
        };
        if def.rewards.xp > 0 {
            state.apply_xp(def.rewards.xp, now);
        }
        state.stats.achievements_unlocked += 1;
        state.updated_at = now;
        self.stage_economy(&mut batch, &state)?;
        self.write(batch)?;

        Ok(Some(UnlockOutcome {
            unlock,
            state,
            transaction,
        }))
    }

    fn list_unlocks(&self, user_id: &UserId) -> Result<Vec<UserAchievement>> {
        let cf = self.cf(cf::UNLOCKS)?;
        let prefix = keys::user_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        let mut unlocks = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            unlocks.push(Self::deserialize(&value)?);
        }
        Ok(unlocks)
    }
}
