//! Per-user statistics store.
//!
//! Each user's record sits behind its own mutex so fights in different wars
//! only contend when the same user acts in both. Callers may hold a war lock
//! while updating stats, never the other way round.
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};

use war_core::{
    BattleRound, Side, StatsAggregator, UserId, UserWarStats, WarConfig, WarOutcome, WarResult,
};

type Slot = Arc<Mutex<UserWarStats>>;

/// Lifetime statistics of every user that ever fought.
pub struct StatsStore {
    config: Arc<WarConfig>,
    users: RwLock<HashMap<UserId, Slot>>,
}

impl StatsStore {
    pub fn new(config: Arc<WarConfig>) -> Self {
        Self {
            config,
            users: RwLock::new(HashMap::new()),
        }
    }

    fn aggregator(&self) -> StatsAggregator<'_> {
        StatsAggregator::new(&self.config)
    }

    fn slot(&self, user: UserId, strength: u32) -> Slot {
        if let Some(slot) = self.read_users().get(&user) {
            return Arc::clone(slot);
        }

        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let slot = users
            .entry(user)
            .or_insert_with(|| Arc::new(Mutex::new(self.aggregator().fresh(strength))));
        Arc::clone(slot)
    }

    fn read_users(&self) -> RwLockReadGuard<'_, HashMap<UserId, Slot>> {
        self.users.read().unwrap_or_else(PoisonError::into_inner)
    }

    // Records are plain data folded in one step, so a poisoned lock still
    // guards a consistent record.
    fn update<R>(&self, user: UserId, strength: u32, f: impl FnOnce(&mut UserWarStats) -> R) -> R {
        let slot = self.slot(user, strength);
        let mut stats = slot.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut stats)
    }

    /// Credits an accepted contribution and returns the updated record.
    pub fn record_contribution(&self, user: UserId, damage: u64, strength: u32) -> UserWarStats {
        let aggregator = self.aggregator();
        self.update(user, strength, |stats| {
            aggregator.on_contribution(stats, damage, strength);
            stats.clone()
        })
    }

    pub fn record_round_closed(&self, round: &BattleRound, participants: &[UserId]) {
        self.aggregator().on_round_closed(round, participants);
        tracing::trace!(
            round = round.index,
            participants = participants.len(),
            "round closed; user records unchanged"
        );
    }

    /// Applies a war's final result to every participant.
    pub fn record_war_terminal(
        &self,
        outcome: &WarOutcome,
        participants: &[(UserId, Side, u64)],
    ) -> Vec<WarResult> {
        let aggregator = self.aggregator();
        let results = aggregator.on_war_terminal(outcome, participants);
        for result in &results {
            self.update(result.user, 0, |stats| aggregator.apply_result(stats, result));
        }
        results
    }

    /// Snapshot of a user's record; `None` if they never fought.
    pub fn get(&self, user: UserId) -> Option<UserWarStats> {
        let slot = self.read_users().get(&user).map(Arc::clone)?;
        let stats = slot.lock().unwrap_or_else(PoisonError::into_inner);
        Some(stats.clone())
    }

    /// Record of a user that never fought.
    pub fn fresh(&self, strength: u32) -> UserWarStats {
        self.aggregator().fresh(strength)
    }

    pub fn len(&self) -> usize {
        self.read_users().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
