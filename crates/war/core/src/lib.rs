//! Deterministic war rules shared by the conflict runtime and offline tools.
//!
//! `war-core` defines the canonical model of a war between two factions: the
//! append-only participant ledger, the round accumulator, the war state
//! machine and the lifetime statistics fold. All mutation of a [`War`] flows
//! through [`engine::WarEngine`]; the crate never reads a clock or performs
//! I/O, so every transition is reproducible from its inputs.
pub mod config;
pub mod damage;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod rng;
pub mod round;
pub mod stats;
pub mod types;
pub mod war;

pub use config::{ConfigError, RankTable, WarConfig};
pub use damage::DamageTotals;
pub use engine::{
    ExecuteError, FightAction, FightError, FightOutcome, ForceCloseAction, InvariantViolation,
    SettleOutcome, TickAction, TransitionPhase, TransitionPhaseError, WarEngine, WarTransition,
};
pub use error::{ConflictError, ErrorSeverity};
pub use ledger::{Contribution, LedgerError, ParticipantLedger, RoundContributions};
pub use rng::{PcgRng, RngOracle, compute_seed, roll_damage, war_seed};
pub use round::{BattleRound, RoundAccumulator, RoundCloseReason, RoundOutcome};
pub use stats::{StatsAggregator, UserWarStats, WarResult};
pub use types::{ContributionId, Side, Timestamp, UserId, WarId, WarStatus};
pub use war::{Belligerents, TerminationReason, War, WarOutcome, WarPhase};
