//! Concurrent conflict engine.
//!
//! The engine owns every live war and serializes access to each one through
//! its own async mutex. Profile lookups happen before that mutex is taken,
//! so a slow profile service never blocks other players of the same war.
//! Wars never wait on each other.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::{Mutex, broadcast};
use tracing::{debug, error, info, warn};
use war_core::{
    BattleRound, Belligerents, Contribution, ExecuteError, FightError, PcgRng, RngOracle,
    SettleOutcome, Side, Timestamp, TransitionPhaseError, UserId, War, WarConfig, WarEngine,
    WarId, WarOutcome, war_seed,
};

use crate::api::{FightResult, Result, RuntimeError, UserStatsView, WarOutcomeView, WarView};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::events::{Event, EventBus, FightEvent, RoundEvent, Topic, WarEvent};
use crate::oracle::ProfileOracle;
use crate::repository::{ContributionRepository, InMemoryContributionLog};
use crate::stats::StatsStore;
use crate::workers::TickerHandle;

type WarSlot = Arc<Mutex<War>>;

/// Summary of one battle tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub rounds_closed: usize,
    pub wars_ended: Vec<WarId>,
}

/// Cloneable handle to the conflict engine.
#[derive(Clone)]
pub struct ConflictEngine {
    inner: Arc<Inner>,
}

struct Inner {
    config: EngineConfig,
    war_config: Arc<WarConfig>,
    wars: RwLock<HashMap<WarId, WarSlot>>,
    next_war_id: AtomicU64,
    stats: StatsStore,
    oracle: Arc<dyn ProfileOracle>,
    rng: Arc<dyn RngOracle>,
    repository: Arc<dyn ContributionRepository>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    seed_entropy: Option<u64>,
}

impl ConflictEngine {
    /// Create a new engine builder
    pub fn builder() -> ConflictEngineBuilder {
        ConflictEngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    pub fn now(&self) -> Timestamp {
        self.inner.clock.now()
    }

    /// Subscribe to one event topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.inner.events.subscribe(topic)
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// Starts the background battle tick.
    pub fn spawn_ticker(&self) -> TickerHandle {
        TickerHandle::spawn(self.clone(), self.inner.config.tick_interval)
    }

    // ========================================================================
    // Scheduler entry points
    // ========================================================================

    /// Opens a new war with the next free id.
    pub fn create_war(&self, belligerents: Belligerents) -> Result<WarView> {
        let id = WarId(self.inner.next_war_id.fetch_add(1, Ordering::SeqCst));
        self.create_war_with_id(id, belligerents)
    }

    /// Opens a new war under a caller-chosen id.
    pub fn create_war_with_id(&self, id: WarId, belligerents: Belligerents) -> Result<WarView> {
        validate_belligerents(&belligerents)?;

        let now = self.now();
        let entropy = self.inner.seed_entropy.unwrap_or_else(rand::random);
        let war = War::new(
            id,
            belligerents,
            now,
            war_seed(entropy, id),
            &self.inner.war_config,
        );
        let view = WarView::from_war(&war, now);
        let deadline = war.deadline();
        let belligerents = war.belligerents().clone();

        {
            let mut wars = self
                .inner
                .wars
                .write()
                .map_err(|_| RuntimeError::LockPoisoned("war registry"))?;
            if wars.contains_key(&id) {
                return Err(RuntimeError::WarAlreadyExists(id));
            }
            wars.insert(id, Arc::new(Mutex::new(war)));
        }
        // Keep generated ids clear of explicitly chosen ones.
        self.inner
            .next_war_id
            .fetch_max(id.0.saturating_add(1), Ordering::SeqCst);

        info!(
            war = %id,
            attacker = %belligerents.attacker,
            defender = %belligerents.defender,
            region = %belligerents.region,
            "war created"
        );
        self.inner.events.publish(WarEvent::WarCreated {
            war: id,
            belligerents,
            deadline,
        });
        Ok(view)
    }

    // ========================================================================
    // Fight
    // ========================================================================

    /// One user attacks or defends in a war.
    ///
    /// `side` must be `"attacker"` or `"defender"` (case-insensitive).
    pub async fn fight(&self, war_id: WarId, user: UserId, side: &str) -> Result<FightResult> {
        let requested = parse_side(side).ok_or_else(|| RuntimeError::InvalidSide {
            war: war_id,
            user,
            requested: side.to_string(),
            existing: None,
        })?;
        let slot = self.slot(war_id)?;

        // Fail fast before paying for a profile lookup.
        {
            let war = slot.lock().await;
            precheck(&war, user, requested, self.now())?;
        }

        let strength = self.lookup_strength(user).await?;

        let mut war = slot.lock().await;
        let now = self.now();

        let settled = WarEngine::new(&mut war, &self.inner.war_config)
            .tick(now)
            .map_err(RuntimeError::Transition)?;
        self.publish_settlement(&war, &settled);

        // The fight runs on a copy; the live war only changes once the audit
        // log holds the contribution.
        let mut next = war.clone();
        let outcome = WarEngine::new(&mut next, &self.inner.war_config)
            .fight_with_strength(self.inner.rng.as_ref(), user, requested, strength, now)
            .map_err(|err| fight_error(war_id, user, requested, err))?;

        let contribution = &outcome.contribution;
        self.audit(contribution)?;
        *war = next;

        debug!(
            war = %war_id,
            user = %user,
            side = %requested,
            damage = contribution.damage,
            round = contribution.round,
            "fight recorded"
        );

        self.inner
            .stats
            .record_contribution(user, contribution.damage, strength);
        self.inner.events.publish(FightEvent::ContributionRecorded {
            contribution: contribution.clone(),
            strength,
        });

        if let Some(round) = &outcome.round.closed_round {
            self.on_round_closed(&war, round);
        }
        if let Some(war_outcome) = &outcome.war_outcome {
            self.on_war_terminated(&war, war_outcome);
        }

        let country = war.belligerents().faction(requested).to_string();
        Ok(FightResult {
            damage_dealt: contribution.damage,
            side: requested,
            message: FightResult::message(&country, contribution.damage),
            round_closed: outcome.round.closed_round.as_ref().map(Into::into),
            war_outcome: outcome.war_outcome.as_ref().map(WarOutcomeView::from),
            war: WarView::from_war(&war, now),
        })
    }

    async fn lookup_strength(&self, user: UserId) -> Result<u32> {
        let policy = self.inner.config.retry;
        let max_attempts = policy.attempts();
        let mut attempt = 1;

        loop {
            match self.inner.oracle.current_strength(user).await {
                Ok(strength) => return Ok(strength),
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    attempt += 1;
                    let delay = policy.backoff(attempt);
                    warn!(
                        user = %user,
                        attempt,
                        max_attempts,
                        ?delay,
                        error = %err,
                        "strength lookup failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    warn!(
                        user = %user,
                        attempts = attempt,
                        error = %err,
                        "strength lookup gave up"
                    );
                    return Err(RuntimeError::DependencyUnavailable {
                        user,
                        attempts: attempt,
                        source: err,
                    });
                }
            }
        }
    }

    // ========================================================================
    // Ticks and administration
    // ========================================================================

    /// Battle tick: closes elapsed rounds and settles expired wars.
    pub async fn tick(&self, now: Timestamp) -> Result<TickReport> {
        let mut report = TickReport::default();
        for slot in self.slots()? {
            let mut war = slot.lock().await;
            if war.is_terminated() {
                continue;
            }
            let settled = WarEngine::new(&mut war, &self.inner.war_config)
                .tick(now)
                .map_err(RuntimeError::Transition)?;
            self.publish_settlement(&war, &settled);

            report.rounds_closed += settled.closed_rounds.len();
            if settled.war_outcome.is_some() {
                report.wars_ended.push(war.id());
            }
        }
        Ok(report)
    }

    /// Terminates a war immediately.
    pub async fn force_close(&self, war_id: WarId, reason: &str) -> Result<WarView> {
        let slot = self.slot(war_id)?;
        let mut war = slot.lock().await;
        let now = self.now();

        let settled = WarEngine::new(&mut war, &self.inner.war_config)
            .force_close(now)
            .map_err(RuntimeError::Transition)?;
        if settled.is_empty() {
            return Err(RuntimeError::WarClosed(war_id));
        }
        info!(war = %war_id, reason, "war force-closed");
        self.publish_settlement(&war, &settled);
        Ok(WarView::from_war(&war, now))
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Wars still accepting fights at `now`, ordered by id.
    pub async fn list_active_wars(&self, now: Timestamp) -> Result<Vec<WarView>> {
        let mut views = Vec::new();
        for slot in self.slots()? {
            let war = slot.lock().await;
            if !war.is_terminal(now) {
                views.push(WarView::from_war(&war, now));
            }
        }
        views.sort_by_key(|view| view.id);
        Ok(views)
    }

    /// Detail view of any war, active or not.
    pub async fn war(&self, war_id: WarId) -> Result<WarView> {
        let slot = self.slot(war_id)?;
        let war = slot.lock().await;
        Ok(WarView::from_war(&war, self.now()))
    }

    /// Contributions of a war in ledger order.
    pub async fn contributions(&self, war_id: WarId) -> Result<Vec<Contribution>> {
        let slot = self.slot(war_id)?;
        let war = slot.lock().await;
        Ok(war.ledger().iter().cloned().collect())
    }

    /// A user's lifetime record.
    ///
    /// Strength, rank and medals come from the profile service when it
    /// answers; otherwise the engine's own record is shown.
    pub async fn user_stats(&self, user: UserId) -> Result<UserStatsView> {
        let stored = self.inner.stats.get(user);
        let mut view = match &stored {
            Some(stats) => UserStatsView::new(user, stats),
            None => UserStatsView::new(user, &self.inner.stats.fresh(0)),
        };

        let oracle = &self.inner.oracle;
        match oracle.current_strength(user).await {
            Ok(strength) => view.current_strength = strength,
            Err(err) => debug!(user = %user, error = %err, "showing last known strength"),
        }
        if let Ok(Some(rank)) = oracle.user_rank(user).await {
            view.rank = rank;
        }
        if let Ok(Some(medals)) = oracle.user_medals(user).await {
            view.medals = medals;
        }
        Ok(view)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn slot(&self, war_id: WarId) -> Result<WarSlot> {
        let wars = self
            .inner
            .wars
            .read()
            .map_err(|_| RuntimeError::LockPoisoned("war registry"))?;
        wars.get(&war_id)
            .cloned()
            .ok_or(RuntimeError::WarNotFound(war_id))
    }

    fn slots(&self) -> Result<Vec<WarSlot>> {
        let wars = self
            .inner
            .wars
            .read()
            .map_err(|_| RuntimeError::LockPoisoned("war registry"))?;
        Ok(wars.values().cloned().collect())
    }

    fn audit(&self, contribution: &Contribution) -> Result<()> {
        self.inner.repository.append(contribution).map_err(|err| {
            error!(
                war = %contribution.war_id,
                user = %contribution.user_id,
                error = %err,
                "audit log rejected contribution; fight discarded"
            );
            RuntimeError::Repository(err)
        })
    }

    fn publish_settlement(&self, war: &War, settled: &SettleOutcome) {
        for round in &settled.closed_rounds {
            self.on_round_closed(war, round);
        }
        if let Some(outcome) = &settled.war_outcome {
            self.on_war_terminated(war, outcome);
        }
    }

    fn on_round_closed(&self, war: &War, round: &BattleRound) {
        let mut participants: Vec<UserId> = war
            .ledger()
            .contributions_for_round(round.index)
            .map(|contribution| contribution.user_id)
            .collect();
        participants.sort_unstable();
        participants.dedup();

        self.inner.stats.record_round_closed(round, &participants);
        info!(
            war = %war.id(),
            round = round.index,
            winner = ?round.winner,
            reason = ?round.close_reason,
            attacker = round.damage.attacker,
            defender = round.damage.defender,
            "round closed"
        );
        self.inner.events.publish(RoundEvent::RoundClosed {
            war: war.id(),
            round: round.clone(),
        });
    }

    fn on_war_terminated(&self, war: &War, outcome: &WarOutcome) {
        let participants = war.ledger().damage_by_participant();
        let results = self.inner.stats.record_war_terminal(outcome, &participants);

        info!(
            war = %war.id(),
            winner = %outcome.winner,
            reason = %outcome.reason,
            attacker_percentage = outcome.attacker_percentage,
            participants = results.len(),
            "war ended"
        );
        self.inner.events.publish(WarEvent::WarTerminated {
            war: war.id(),
            outcome: outcome.clone(),
        });
    }
}

fn parse_side(raw: &str) -> Option<Side> {
    raw.trim().to_ascii_lowercase().parse().ok()
}

fn precheck(war: &War, user: UserId, side: Side, now: Timestamp) -> Result<()> {
    if war.is_terminal(now) {
        return Err(RuntimeError::WarClosed(war.id()));
    }
    if let Some(existing) = war.ledger().side_of(user)
        && existing != side
    {
        return Err(RuntimeError::InvalidSide {
            war: war.id(),
            user,
            requested: side.to_string(),
            existing: Some(existing),
        });
    }
    Ok(())
}

fn fight_error(war: WarId, user: UserId, requested: Side, err: ExecuteError) -> RuntimeError {
    match err {
        ExecuteError::Fight(TransitionPhaseError {
            error: FightError::WarClosed { .. },
            ..
        }) => RuntimeError::WarClosed(war),
        ExecuteError::Fight(TransitionPhaseError {
            error: FightError::SideConflict { existing, .. },
            ..
        }) => RuntimeError::InvalidSide {
            war,
            user,
            requested: requested.to_string(),
            existing: Some(existing),
        },
        other => RuntimeError::Transition(other),
    }
}

fn validate_belligerents(belligerents: &Belligerents) -> Result<()> {
    let attacker = belligerents.attacker.trim();
    let defender = belligerents.defender.trim();
    if attacker.is_empty() || defender.is_empty() {
        return Err(RuntimeError::InvalidWar(
            "both factions need a name".to_string(),
        ));
    }
    if belligerents.region.trim().is_empty() {
        return Err(RuntimeError::InvalidWar(
            "the contested region needs a name".to_string(),
        ));
    }
    if attacker.eq_ignore_ascii_case(defender) {
        return Err(RuntimeError::InvalidWar(format!(
            "{attacker} cannot wage war on itself"
        )));
    }
    Ok(())
}

/// Builder for [`ConflictEngine`].
pub struct ConflictEngineBuilder {
    config: EngineConfig,
    oracle: Option<Arc<dyn ProfileOracle>>,
    rng: Arc<dyn RngOracle>,
    repository: Option<Arc<dyn ContributionRepository>>,
    clock: Arc<dyn Clock>,
    seed_entropy: Option<u64>,
}

impl ConflictEngineBuilder {
    fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            oracle: None,
            rng: Arc::new(PcgRng),
            repository: None,
            clock: Arc::new(SystemClock),
            seed_entropy: None,
        }
    }

    /// Override engine configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the required profile service
    pub fn oracle(mut self, oracle: impl ProfileOracle + 'static) -> Self {
        self.oracle = Some(Arc::new(oracle));
        self
    }

    pub fn shared_oracle(mut self, oracle: Arc<dyn ProfileOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Damage roll source (default: [`PcgRng`])
    pub fn rng(mut self, rng: impl RngOracle + 'static) -> Self {
        self.rng = Arc::new(rng);
        self
    }

    /// Audit log (default: in-memory)
    pub fn repository(mut self, repository: Arc<dyn ContributionRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Time source (default: [`SystemClock`])
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Fixes the entropy wars derive their seeds from, making damage rolls
    /// reproducible across runs.
    pub fn seed_entropy(mut self, entropy: u64) -> Self {
        self.seed_entropy = Some(entropy);
        self
    }

    pub fn build(self) -> Result<ConflictEngine> {
        self.config.war.validate()?;
        let oracle = self.oracle.ok_or(RuntimeError::MissingOracle)?;
        let repository = self
            .repository
            .unwrap_or_else(|| Arc::new(InMemoryContributionLog::new()));
        let war_config = Arc::new(self.config.war.clone());

        Ok(ConflictEngine {
            inner: Arc::new(Inner {
                events: EventBus::with_capacity(self.config.event_buffer_size),
                stats: StatsStore::new(Arc::clone(&war_config)),
                config: self.config,
                war_config,
                wars: RwLock::new(HashMap::new()),
                next_war_id: AtomicU64::new(1),
                oracle,
                rng: self.rng,
                repository,
                clock: self.clock,
                seed_entropy: self.seed_entropy,
            }),
        })
    }
}
