//! The war aggregate: belligerents, running totals, rounds and ledger.
use core::time::Duration;

use crate::config::WarConfig;
use crate::damage::DamageTotals;
use crate::ledger::ParticipantLedger;
use crate::round::{BattleRound, RoundAccumulator};
use crate::types::{Side, Timestamp, WarId, WarStatus};

/// The two factions at war and the contested region.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Belligerents {
    pub attacker: String,
    pub defender: String,
    pub region: String,
    /// Display flags (usually an emoji) of attacker and defender.
    #[cfg_attr(feature = "serde", serde(default))]
    pub attacker_flag: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub defender_flag: Option<String>,
}

impl Belligerents {
    pub fn new(
        attacker: impl Into<String>,
        defender: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            attacker: attacker.into(),
            defender: defender.into(),
            region: region.into(),
            attacker_flag: None,
            defender_flag: None,
        }
    }

    pub fn with_flags(mut self, attacker: impl Into<String>, defender: impl Into<String>) -> Self {
        self.attacker_flag = Some(attacker.into());
        self.defender_flag = Some(defender.into());
        self
    }

    pub fn faction(&self, side: Side) -> &str {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }
}

/// Why a war stopped accepting contributions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TerminationReason {
    /// The final permitted round closed.
    RoundLimit,
    /// One side reached the decisive share of cumulative damage.
    DecisiveShare,
    /// The war's time budget ran out.
    Deadline,
    /// An operator closed the war.
    ForceClosed,
}

/// Final result of a terminated war.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WarOutcome {
    /// Side with strictly more cumulative damage; a tie goes to the defender.
    pub winner: Side,
    pub totals: DamageTotals,
    pub attacker_percentage: f64,
    pub reason: TerminationReason,
    pub rounds_fought: usize,
    pub attacker_rounds_won: usize,
    pub defender_rounds_won: usize,
    pub ended_at: Timestamp,
}

/// Lifecycle position of a war.
#[derive(Clone, Debug, PartialEq)]
pub enum WarPhase {
    /// Accepting contributions; `round` is the open round's index.
    Open { round: u8 },
    Terminal(WarOutcome),
}

/// A single war between an attacker and a defender.
///
/// All mutation goes through [`crate::WarEngine`]; the fields are read
/// through accessors so the running totals cannot drift from the ledger.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct War {
    id: WarId,
    belligerents: Belligerents,
    created_at: Timestamp,
    deadline: Timestamp,
    /// Base seed for damage rolls.
    seed: u64,
    /// Incremented by every accepted fight.
    nonce: u64,
    totals: DamageTotals,
    rounds: RoundAccumulator,
    ledger: ParticipantLedger,
    outcome: Option<WarOutcome>,
}

impl War {
    pub fn new(
        id: WarId,
        belligerents: Belligerents,
        created_at: Timestamp,
        seed: u64,
        config: &WarConfig,
    ) -> Self {
        Self {
            id,
            belligerents,
            created_at,
            deadline: created_at.saturating_add(config.war_duration),
            seed,
            nonce: 0,
            totals: DamageTotals::ZERO,
            rounds: RoundAccumulator::new(created_at),
            ledger: ParticipantLedger::new(id),
            outcome: None,
        }
    }

    pub fn id(&self) -> WarId {
        self.id
    }

    pub fn belligerents(&self) -> &Belligerents {
        &self.belligerents
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn deadline(&self) -> Timestamp {
        self.deadline
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn totals(&self) -> DamageTotals {
        self.totals
    }

    pub fn total_damage(&self) -> u64 {
        self.totals.total()
    }

    pub fn attacker_percentage(&self) -> f64 {
        self.totals.attacker_percentage()
    }

    pub fn status(&self) -> WarStatus {
        self.totals.status()
    }

    pub fn rounds(&self) -> &RoundAccumulator {
        &self.rounds
    }

    pub fn battle_rounds(&self) -> &[BattleRound] {
        self.rounds.rounds()
    }

    pub fn ledger(&self) -> &ParticipantLedger {
        &self.ledger
    }

    pub fn participant_count(&self) -> usize {
        self.ledger.participant_count()
    }

    pub fn outcome(&self) -> Option<&WarOutcome> {
        self.outcome.as_ref()
    }

    /// True once the war has been settled.
    pub fn is_terminated(&self) -> bool {
        self.outcome.is_some()
    }

    /// True if the war is settled or its deadline has passed at `now`,
    /// even if no tick has settled it yet.
    pub fn is_terminal(&self, now: Timestamp) -> bool {
        self.is_terminated() || now >= self.deadline
    }

    pub fn phase(&self) -> WarPhase {
        match (&self.outcome, self.rounds.current_index()) {
            (Some(outcome), _) => WarPhase::Terminal(outcome.clone()),
            (None, Some(round)) => WarPhase::Open { round },
            // Unreachable while the war is live: a round is always open.
            (None, None) => WarPhase::Open {
                round: self.rounds.closed_count() as u8,
            },
        }
    }

    /// Time left until the deadline; zero once terminated.
    pub fn time_remaining(&self, now: Timestamp) -> Duration {
        if self.is_terminated() {
            return Duration::ZERO;
        }
        self.deadline.saturating_duration_since(now)
    }

    pub(crate) fn ledger_mut(&mut self) -> &mut ParticipantLedger {
        &mut self.ledger
    }

    pub(crate) fn rounds_mut(&mut self) -> &mut RoundAccumulator {
        &mut self.rounds
    }

    pub(crate) fn credit(&mut self, side: Side, damage: u64) {
        self.totals.add(side, damage);
        self.nonce += 1;
    }

    /// Settles the war. Seals the ledger, closes (or drops) the open round
    /// and freezes the outcome. Idempotent: a second call returns the first
    /// outcome unchanged.
    pub(crate) fn terminate(
        &mut self,
        reason: TerminationReason,
        at: Timestamp,
    ) -> (Option<BattleRound>, WarOutcome) {
        if let Some(outcome) = &self.outcome {
            return (None, outcome.clone());
        }

        self.ledger.seal();
        let closed = self.rounds.close_for_war_end(at);

        let outcome = WarOutcome {
            winner: self.totals.leader(),
            totals: self.totals,
            attacker_percentage: self.totals.attacker_percentage(),
            reason,
            rounds_fought: self.rounds.closed_count(),
            attacker_rounds_won: self.rounds.won_by(Side::Attacker),
            defender_rounds_won: self.rounds.won_by(Side::Defender),
            ended_at: at,
        };
        self.outcome = Some(outcome.clone());
        (closed, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn war() -> War {
        War::new(
            WarId(1),
            Belligerents::new("Germany", "France", "Alsace-Lorraine"),
            Timestamp(1_000),
            7,
            &WarConfig::default(),
        )
    }

    #[test]
    fn new_war_is_open_and_balanced() {
        let war = war();
        assert_eq!(war.phase(), WarPhase::Open { round: 1 });
        assert_eq!(war.status(), WarStatus::Balanced);
        assert_eq!(war.attacker_percentage(), 50.0);
        assert_eq!(war.participant_count(), 0);
        assert_eq!(
            war.deadline(),
            Timestamp(1_000).saturating_add(WarConfig::DEFAULT_WAR_DURATION)
        );
        assert_eq!(war.belligerents().faction(Side::Defender), "France");
    }

    #[test]
    fn deadline_makes_war_terminal_before_settlement() {
        let war = war();
        assert!(!war.is_terminal(Timestamp(1_001)));
        assert!(war.is_terminal(war.deadline()));
        assert!(!war.is_terminated());
        assert_eq!(war.time_remaining(war.deadline()), Duration::ZERO);
    }

    #[test]
    fn terminate_is_idempotent_and_seals_ledger() {
        let mut war = war();
        let (closed, first) = war.terminate(TerminationReason::ForceClosed, Timestamp(2_000));
        // Nobody fought, so the open round is dropped.
        assert!(closed.is_none());
        assert_eq!(first.winner, Side::Defender);
        assert_eq!(first.rounds_fought, 0);
        assert!(war.ledger().is_sealed());

        let (_, second) = war.terminate(TerminationReason::Deadline, Timestamp(3_000));
        assert_eq!(second, first);
        assert_eq!(war.time_remaining(Timestamp(0)), Duration::ZERO);
        assert!(matches!(war.phase(), WarPhase::Terminal(_)));
    }
}
