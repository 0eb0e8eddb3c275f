//! Runtime orchestration for the war conflict engine.
//!
//! This crate wraps the pure `war-core` reducer in a concurrent engine:
//! per-war locking, profile lookups with bounded retry, lifetime statistics,
//! an audit log and topic-based events. Consumers embed
//! [`ConflictEngine`] and drive it through fights, ticks and reads.
//!
//! Modules are organized by responsibility:
//! - [`engine`] hosts the orchestrator and builder
//! - [`api`] exposes the errors and views downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`workers`] keeps background tasks (the battle tick)
//! - [`oracle`] and [`repository`] adapt external services and storage
pub mod api;
pub mod clock;
pub mod config;
pub mod engine;
pub mod events;
pub mod oracle;
pub mod repository;
pub mod stats;
pub mod workers;

pub use api::{
    BattleRoundView, FightResult, Result, RuntimeError, UserStatsView, WarOutcomeView, WarView,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, RetryPolicy};
pub use engine::{ConflictEngine, ConflictEngineBuilder, TickReport};
pub use events::{Event, EventBus, FightEvent, RoundEvent, Topic, WarEvent};
pub use oracle::{OracleError, ProfileOracle, StaticProfileOracle};
pub use repository::{
    ContributionRepository, FileContributionLog, InMemoryContributionLog, RepositoryError,
};
pub use stats::StatsStore;
pub use workers::{TickWorker, TickerHandle};
