//! Round accumulator: turns contributions into round results.
//!
//! A war is fought as a sequence of at most [`WarConfig::MAX_ROUNDS`]
//! rounds, exactly one of which is open while the war is running. The open
//! round closes when its combined damage reaches the configured threshold or
//! when its time slice elapses; the side with strictly more round damage
//! wins it, and an exact tie goes to the defender.
use arrayvec::ArrayVec;

use crate::config::WarConfig;
use crate::damage::DamageTotals;
use crate::ledger::Contribution;
use crate::types::{Side, Timestamp};
use crate::war::TerminationReason;

/// Why a round was closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RoundCloseReason {
    /// Combined round damage reached the round threshold.
    DamageThreshold,
    /// The round's time slice elapsed.
    TimeSlice,
    /// The war ended (deadline or force-close) while this round was open.
    WarEnded,
}

/// One bounded sub-contest of a war. Immutable once closed.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleRound {
    /// 1-based ordinal.
    pub index: u8,
    /// Damage dealt during this round only.
    pub damage: DamageTotals,
    pub winner: Option<Side>,
    pub opened_at: Timestamp,
    pub closed_at: Option<Timestamp>,
    pub close_reason: Option<RoundCloseReason>,
}

impl BattleRound {
    fn open(index: u8, opened_at: Timestamp) -> Self {
        Self {
            index,
            damage: DamageTotals::ZERO,
            winner: None,
            opened_at,
            closed_at: None,
            close_reason: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    pub fn is_closed(&self) -> bool {
        !self.is_open()
    }

    pub fn total_damage(&self) -> u64 {
        self.damage.total()
    }

    fn close(&mut self, at: Timestamp, reason: RoundCloseReason) {
        self.winner = Some(self.damage.leader());
        self.closed_at = Some(at);
        self.close_reason = Some(reason);
    }
}

/// Result of feeding a contribution (or a tick) into the accumulator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundOutcome {
    pub round_closed: bool,
    pub closed_round: Option<BattleRound>,
    /// Set when closing this round also ends the war.
    pub ends_war: Option<TerminationReason>,
}

impl RoundOutcome {
    fn unchanged() -> Self {
        Self::default()
    }
}

/// Ordered rounds of one war; the last one is open while the war runs.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundAccumulator {
    rounds: ArrayVec<BattleRound, { WarConfig::MAX_ROUNDS }>,
}

impl RoundAccumulator {
    /// Creates the accumulator with round 1 open.
    pub fn new(opened_at: Timestamp) -> Self {
        let mut rounds = ArrayVec::new();
        rounds.push(BattleRound::open(1, opened_at));
        Self { rounds }
    }

    /// All rounds, the open one (if any) last.
    pub fn rounds(&self) -> &[BattleRound] {
        &self.rounds
    }

    pub fn current(&self) -> Option<&BattleRound> {
        self.rounds.last().filter(|round| round.is_open())
    }

    pub fn current_index(&self) -> Option<u8> {
        self.current().map(|round| round.index)
    }

    pub fn closed(&self) -> impl Iterator<Item = &BattleRound> {
        self.rounds.iter().filter(|round| round.is_closed())
    }

    pub fn closed_count(&self) -> usize {
        self.closed().count()
    }

    /// Rounds won by `side` so far.
    pub fn won_by(&self, side: Side) -> usize {
        self.closed()
            .filter(|round| round.winner == Some(side))
            .count()
    }

    /// Sum of every round's damage, open round included.
    pub fn damage_sum(&self) -> DamageTotals {
        self.rounds
            .iter()
            .fold(DamageTotals::ZERO, |mut sum, round| {
                sum.add(Side::Attacker, round.damage.attacker);
                sum.add(Side::Defender, round.damage.defender);
                sum
            })
    }

    /// Adds a contribution to the open round and closes it when the damage
    /// threshold is reached.
    ///
    /// `cumulative` is the war-wide total *including* this contribution; it
    /// decides whether closing the round also ends the war.
    pub fn apply(
        &mut self,
        contribution: &Contribution,
        cumulative: &DamageTotals,
        config: &WarConfig,
    ) -> RoundOutcome {
        let Some(round) = self.rounds.last_mut().filter(|round| round.is_open()) else {
            return RoundOutcome::unchanged();
        };
        round.damage.add(contribution.side, contribution.damage);

        if round.total_damage() >= config.round_damage_threshold {
            self.close_current(
                contribution.recorded_at,
                RoundCloseReason::DamageThreshold,
                cumulative,
                config,
            )
        } else {
            RoundOutcome::unchanged()
        }
    }

    /// Closes the open round if its time slice ended at or before `now`.
    ///
    /// The next round opens at the scheduled boundary, not at `now`, so a
    /// late tick can catch up by calling this repeatedly.
    pub fn close_if_elapsed(
        &mut self,
        now: Timestamp,
        cumulative: &DamageTotals,
        config: &WarConfig,
    ) -> RoundOutcome {
        let Some(round) = self.current() else {
            return RoundOutcome::unchanged();
        };
        let boundary = round.opened_at.saturating_add(config.round_duration);
        if now < boundary {
            return RoundOutcome::unchanged();
        }
        self.close_current(boundary, RoundCloseReason::TimeSlice, cumulative, config)
    }

    /// Closes the open round because the whole war ended.
    ///
    /// A round nobody fought in is dropped rather than handed to the
    /// defender.
    pub fn close_for_war_end(&mut self, at: Timestamp) -> Option<BattleRound> {
        let round = self.rounds.last_mut().filter(|round| round.is_open())?;
        if round.damage.is_zero() {
            self.rounds.pop();
            return None;
        }
        round.close(at, RoundCloseReason::WarEnded);
        Some(round.clone())
    }

    fn close_current(
        &mut self,
        at: Timestamp,
        reason: RoundCloseReason,
        cumulative: &DamageTotals,
        config: &WarConfig,
    ) -> RoundOutcome {
        let Some(round) = self.rounds.last_mut() else {
            return RoundOutcome::unchanged();
        };
        round.close(at, reason);
        let closed = round.clone();
        let closed_count = usize::from(closed.index);

        let ends_war = if closed_count >= WarConfig::MAX_ROUNDS {
            Some(TerminationReason::RoundLimit)
        } else if config.decisive_share_percent.is_some_and(|share| {
            closed_count >= config.min_rounds_before_decisive
                && cumulative.has_share_at_least(share)
        }) {
            Some(TerminationReason::DecisiveShare)
        } else {
            None
        };

        if ends_war.is_none() {
            // Capacity is MAX_ROUNDS and closed_count < MAX_ROUNDS here.
            self.rounds.push(BattleRound::open(closed.index + 1, at));
        }

        RoundOutcome {
            round_closed: true,
            closed_round: Some(closed),
            ends_war,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContributionId, UserId, WarId};

    fn config(threshold: u64) -> WarConfig {
        WarConfig::default()
            .with_round_damage_threshold(threshold)
            .with_decisive_share(None)
    }

    fn hit(side: Side, damage: u64, round: u8, at: u64) -> Contribution {
        Contribution {
            id: ContributionId(1),
            war_id: WarId(1),
            user_id: UserId(1),
            side,
            damage,
            round,
            recorded_at: Timestamp(at),
        }
    }

    #[test]
    fn threshold_closes_round_and_opens_next() {
        let config = config(1_000);
        let mut rounds = RoundAccumulator::new(Timestamp(0));
        let mut cumulative = DamageTotals::ZERO;

        cumulative.add(Side::Attacker, 600);
        let first = rounds.apply(&hit(Side::Attacker, 600, 1, 5), &cumulative, &config);
        assert!(!first.round_closed);

        cumulative.add(Side::Defender, 400);
        let second = rounds.apply(&hit(Side::Defender, 400, 1, 9), &cumulative, &config);
        assert!(second.round_closed);
        let closed = second.closed_round.unwrap();
        assert_eq!(closed.index, 1);
        assert_eq!(closed.winner, Some(Side::Attacker));
        assert_eq!(closed.close_reason, Some(RoundCloseReason::DamageThreshold));
        assert_eq!(second.ends_war, None);

        let current = rounds.current().unwrap();
        assert_eq!(current.index, 2);
        assert_eq!(current.opened_at, Timestamp(9));
        assert_eq!(current.damage, DamageTotals::ZERO);
    }

    #[test]
    fn exact_tie_goes_to_defender() {
        let config = config(1_600);
        let mut rounds = RoundAccumulator::new(Timestamp(0));
        let cumulative = DamageTotals::new(800, 800);

        rounds.apply(&hit(Side::Attacker, 800, 1, 1), &cumulative, &config);
        let outcome = rounds.apply(&hit(Side::Defender, 800, 1, 2), &cumulative, &config);

        assert_eq!(outcome.closed_round.unwrap().winner, Some(Side::Defender));
    }

    #[test]
    fn eleventh_round_ends_the_war() {
        let config = config(10);
        let mut rounds = RoundAccumulator::new(Timestamp(0));
        let cumulative = DamageTotals::new(110, 0);

        for index in 1..=10u8 {
            let outcome = rounds.apply(
                &hit(Side::Attacker, 10, index, index.into()),
                &cumulative,
                &config,
            );
            assert!(outcome.round_closed);
            assert_eq!(outcome.ends_war, None);
        }
        let last = rounds.apply(&hit(Side::Attacker, 10, 11, 11), &cumulative, &config);
        assert_eq!(last.ends_war, Some(TerminationReason::RoundLimit));
        assert_eq!(rounds.closed_count(), WarConfig::MAX_ROUNDS);
        assert!(rounds.current().is_none());

        // Nothing is open any more; further input is ignored.
        let ignored = rounds.apply(&hit(Side::Attacker, 10, 12, 12), &cumulative, &config);
        assert_eq!(ignored, RoundOutcome::default());
        assert_eq!(rounds.rounds().len(), WarConfig::MAX_ROUNDS);
    }

    #[test]
    fn decisive_share_counts_only_after_minimum_rounds() {
        let mut config = config(10).with_decisive_share(Some(90));
        config.min_rounds_before_decisive = 2;
        let mut rounds = RoundAccumulator::new(Timestamp(0));
        let lopsided = DamageTotals::new(100, 0);

        let first = rounds.apply(&hit(Side::Attacker, 10, 1, 1), &lopsided, &config);
        assert_eq!(first.ends_war, None);
        let second = rounds.apply(&hit(Side::Attacker, 10, 2, 2), &lopsided, &config);
        assert_eq!(second.ends_war, Some(TerminationReason::DecisiveShare));
    }

    #[test]
    fn elapsed_time_slice_closes_round_at_boundary() {
        let config = config(1_000_000).with_round_duration(std::time::Duration::from_millis(100));
        let mut rounds = RoundAccumulator::new(Timestamp(0));
        let cumulative = DamageTotals::ZERO;

        let early = rounds.close_if_elapsed(Timestamp(99), &cumulative, &config);
        assert!(!early.round_closed);

        let outcome = rounds.close_if_elapsed(Timestamp(250), &cumulative, &config);
        let closed = outcome.closed_round.unwrap();
        assert_eq!(closed.closed_at, Some(Timestamp(100)));
        assert_eq!(closed.close_reason, Some(RoundCloseReason::TimeSlice));
        assert_eq!(rounds.current().unwrap().opened_at, Timestamp(100));

        // Catch-up: the second slice has also elapsed.
        let second = rounds.close_if_elapsed(Timestamp(250), &cumulative, &config);
        assert!(second.round_closed);
        let third = rounds.close_if_elapsed(Timestamp(250), &cumulative, &config);
        assert!(!third.round_closed);
    }

    #[test]
    fn war_end_drops_an_untouched_round() {
        let mut rounds = RoundAccumulator::new(Timestamp(0));
        assert_eq!(rounds.close_for_war_end(Timestamp(5)), None);
        assert!(rounds.rounds().is_empty());

        let config = config(1_000);
        let mut rounds = RoundAccumulator::new(Timestamp(0));
        let cumulative = DamageTotals::new(10, 0);
        rounds.apply(&hit(Side::Attacker, 10, 1, 1), &cumulative, &config);
        let closed = rounds.close_for_war_end(Timestamp(5)).unwrap();
        assert_eq!(closed.close_reason, Some(RoundCloseReason::WarEnded));
        assert_eq!(closed.winner, Some(Side::Attacker));
    }
}
