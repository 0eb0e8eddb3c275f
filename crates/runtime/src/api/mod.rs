//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on orchestration, workers, or infrastructure.

pub mod errors;
pub mod view;

pub use errors::{Result, RuntimeError};
pub use view::{
    BattleRoundView, FightResult, UserStatsView, WarOutcomeView, WarView, format_time_left,
};
