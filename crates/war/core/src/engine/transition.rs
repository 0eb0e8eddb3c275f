//! War transitions and the three-phase pipeline that drives them.
use crate::config::WarConfig;
use crate::ledger::Contribution;
use crate::round::{BattleRound, RoundOutcome};
use crate::types::{Side, Timestamp, UserId};
use crate::war::{TerminationReason, War, WarOutcome};

use super::errors::{FightError, InvariantViolation, TransitionPhase, TransitionPhaseError};

/// Defines how one kind of action mutates a [`War`].
///
/// Implementors can override the validation hooks to surface pre- and
/// post-conditions that must hold around the mutation. Hooks receive the
/// war configuration read-only and must stay side-effect free.
pub trait WarTransition {
    type Output;
    type Error;

    /// Validates pre-conditions using the war **before** mutation.
    fn pre_validate(&self, _war: &War, _config: &WarConfig) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Mutates the war. Implementations may assume `pre_validate` passed.
    fn apply(&self, war: &mut War, config: &WarConfig) -> Result<Self::Output, Self::Error>;

    /// Validates post-conditions using the war **after** mutation.
    fn post_validate(&self, _war: &War, _config: &WarConfig) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Runs a transition through pre_validate, apply and post_validate.
#[inline]
pub(super) fn drive_transition<T>(
    transition: &T,
    war: &mut War,
    config: &WarConfig,
) -> Result<T::Output, TransitionPhaseError<T::Error>>
where
    T: WarTransition,
{
    transition
        .pre_validate(war, config)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::PreValidate, error))?;

    let output = transition
        .apply(war, config)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::Apply, error))?;

    transition
        .post_validate(war, config)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::PostValidate, error))?;

    Ok(output)
}

/// Checks that the running counters still agree with the ledger.
pub(super) fn check_invariants(war: &War) -> Result<(), InvariantViolation> {
    let running = war.totals();
    let replayed = war.ledger().replay_totals();
    if running != replayed {
        return Err(InvariantViolation::TotalsDiverged {
            war: war.id(),
            running: (running.attacker, running.defender),
            replayed: (replayed.attacker, replayed.defender),
        });
    }

    let rounds = war.rounds().damage_sum();
    if rounds != running {
        return Err(InvariantViolation::RoundSumDiverged {
            war: war.id(),
            rounds: (rounds.attacker, rounds.defender),
            running: (running.attacker, running.defender),
        });
    }

    let closed = war.rounds().closed_count();
    if closed > WarConfig::MAX_ROUNDS {
        return Err(InvariantViolation::TooManyRounds {
            war: war.id(),
            closed,
            limit: WarConfig::MAX_ROUNDS,
        });
    }

    if war.is_terminated() {
        if !war.ledger().is_sealed() {
            return Err(InvariantViolation::UnsealedLedger { war: war.id() });
        }
    } else if war.rounds().current().is_none() {
        return Err(InvariantViolation::MissingOpenRound { war: war.id() });
    }

    Ok(())
}

/// Settles `war` and reports the round its termination closed, if any.
fn settle(
    war: &mut War,
    reason: TerminationReason,
    at: Timestamp,
    closed_rounds: &mut Vec<BattleRound>,
) -> WarOutcome {
    let (closed, outcome) = war.terminate(reason, at);
    closed_rounds.extend(closed);
    outcome
}

// ============================================================================
// Fight
// ============================================================================

/// One user's attack or defence with an already rolled amount of damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FightAction {
    pub user: UserId,
    pub side: Side,
    pub damage: u64,
    pub at: Timestamp,
}

/// Everything a fight changed.
#[derive(Clone, Debug, PartialEq)]
pub struct FightOutcome {
    pub contribution: Contribution,
    pub round: RoundOutcome,
    /// Set when this fight ended the war.
    pub war_outcome: Option<WarOutcome>,
}

impl WarTransition for FightAction {
    type Output = FightOutcome;
    type Error = FightError;

    fn pre_validate(&self, war: &War, _config: &WarConfig) -> Result<(), Self::Error> {
        if war.is_terminal(self.at) || war.rounds().current().is_none() {
            return Err(FightError::WarClosed { war: war.id() });
        }
        if self.damage == 0 {
            return Err(FightError::ZeroDamage);
        }
        war.ledger().check(self.user, self.side)?;
        Ok(())
    }

    fn apply(&self, war: &mut War, config: &WarConfig) -> Result<Self::Output, Self::Error> {
        let round_index = war
            .rounds()
            .current_index()
            .ok_or(FightError::WarClosed { war: war.id() })?;

        let contribution = war
            .ledger_mut()
            .record(self.user, self.side, self.damage, round_index, self.at)?
            .clone();
        war.credit(self.side, self.damage);

        let cumulative = war.totals();
        let round = war.rounds_mut().apply(&contribution, &cumulative, config);

        let war_outcome = round.ends_war.map(|reason| {
            let (_, outcome) = war.terminate(reason, contribution.recorded_at);
            outcome
        });

        Ok(FightOutcome {
            contribution,
            round,
            war_outcome,
        })
    }

    fn post_validate(&self, war: &War, _config: &WarConfig) -> Result<(), Self::Error> {
        check_invariants(war).map_err(FightError::from)
    }
}

// ============================================================================
// Tick and force-close
// ============================================================================

/// Rounds and war settled by a tick or a force-close.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettleOutcome {
    pub closed_rounds: Vec<BattleRound>,
    pub war_outcome: Option<WarOutcome>,
}

impl SettleOutcome {
    pub fn is_empty(&self) -> bool {
        self.closed_rounds.is_empty() && self.war_outcome.is_none()
    }
}

/// Battle tick: closes rounds whose time slice elapsed and ends the war
/// once its deadline has passed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickAction {
    pub at: Timestamp,
}

impl WarTransition for TickAction {
    type Output = SettleOutcome;
    type Error = InvariantViolation;

    fn apply(&self, war: &mut War, config: &WarConfig) -> Result<Self::Output, Self::Error> {
        let mut settled = SettleOutcome::default();
        if war.is_terminated() {
            return Ok(settled);
        }

        // Rounds whose slice ended after the deadline are settled by the
        // deadline instead.
        let horizon = self.at.min(war.deadline());
        loop {
            let cumulative = war.totals();
            let round = war
                .rounds_mut()
                .close_if_elapsed(horizon, &cumulative, config);
            let Some(closed) = round.closed_round else {
                break;
            };
            let at = closed.closed_at.unwrap_or(horizon);
            settled.closed_rounds.push(closed);
            if let Some(reason) = round.ends_war {
                settled.war_outcome = Some(settle(war, reason, at, &mut settled.closed_rounds));
                return Ok(settled);
            }
        }

        if self.at >= war.deadline() {
            let deadline = war.deadline();
            settled.war_outcome = Some(settle(
                war,
                TerminationReason::Deadline,
                deadline,
                &mut settled.closed_rounds,
            ));
        }
        Ok(settled)
    }

    fn post_validate(&self, war: &War, _config: &WarConfig) -> Result<(), Self::Error> {
        check_invariants(war)
    }
}

/// Operator-initiated termination. A no-op on an already settled war.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForceCloseAction {
    pub at: Timestamp,
}

impl WarTransition for ForceCloseAction {
    type Output = SettleOutcome;
    type Error = InvariantViolation;

    fn apply(&self, war: &mut War, _config: &WarConfig) -> Result<Self::Output, Self::Error> {
        let mut settled = SettleOutcome::default();
        if war.is_terminated() {
            return Ok(settled);
        }
        settled.war_outcome = Some(settle(
            war,
            TerminationReason::ForceClosed,
            self.at,
            &mut settled.closed_rounds,
        ));
        Ok(settled)
    }

    fn post_validate(&self, war: &War, _config: &WarConfig) -> Result<(), Self::Error> {
        check_invariants(war)
    }
}
