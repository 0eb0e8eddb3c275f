//! War transition pipeline.
//!
//! The [`WarEngine`] is the authoritative reducer for a single [`War`]. Every
//! mutation (fights, battle ticks, force-closes) flows through the same
//! pre_validate → apply → post_validate pipeline, and post-validation
//! replays the ledger to prove the running counters did not drift.

mod errors;
mod transition;

pub use errors::{
    ExecuteError, FightError, InvariantViolation, TransitionPhase, TransitionPhaseError,
};
pub use transition::{
    FightAction, FightOutcome, ForceCloseAction, SettleOutcome, TickAction, WarTransition,
};

use crate::config::WarConfig;
use crate::rng::{RngOracle, compute_seed, roll_damage};
use crate::types::{Side, Timestamp, UserId};
use crate::war::War;

/// Seed context of the damage roll.
const DAMAGE_ROLL_CONTEXT: u32 = 0;

/// Reducer over one war.
pub struct WarEngine<'a> {
    war: &'a mut War,
    config: &'a WarConfig,
}

impl<'a> WarEngine<'a> {
    pub fn new(war: &'a mut War, config: &'a WarConfig) -> Self {
        Self { war, config }
    }

    /// Rolls the damage `user` would deal with `strength` as the war's next
    /// action. Deterministic in the war seed, its nonce and the user.
    pub fn roll_damage(&self, rng: &dyn RngOracle, user: UserId, strength: u32) -> u64 {
        let seed = compute_seed(self.war.seed(), self.war.nonce(), user, DAMAGE_ROLL_CONTEXT);
        roll_damage(rng, seed, strength, self.config)
    }

    /// Rolls damage and records the fight in one step.
    pub fn fight_with_strength(
        &mut self,
        rng: &dyn RngOracle,
        user: UserId,
        side: Side,
        strength: u32,
        at: Timestamp,
    ) -> Result<FightOutcome, ExecuteError> {
        let damage = self.roll_damage(rng, user, strength);
        self.fight(FightAction {
            user,
            side,
            damage,
            at,
        })
    }

    /// Records one fight.
    ///
    /// Does not settle elapsed rounds first; callers that hold a clock run
    /// [`WarEngine::tick`] before fighting.
    pub fn fight(&mut self, action: FightAction) -> Result<FightOutcome, ExecuteError> {
        transition::drive_transition(&action, self.war, self.config).map_err(ExecuteError::Fight)
    }

    /// Closes elapsed rounds and settles the war once its deadline passed.
    pub fn tick(&mut self, at: Timestamp) -> Result<SettleOutcome, ExecuteError> {
        transition::drive_transition(&TickAction { at }, self.war, self.config)
            .map_err(ExecuteError::Tick)
    }

    /// Terminates the war immediately. Empty outcome if already settled.
    pub fn force_close(&mut self, at: Timestamp) -> Result<SettleOutcome, ExecuteError> {
        transition::drive_transition(&ForceCloseAction { at }, self.war, self.config)
            .map_err(ExecuteError::ForceClose)
    }
}
