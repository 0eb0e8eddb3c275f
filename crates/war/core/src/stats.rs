//! Lifetime per-user statistics folded from war events.
//!
//! The aggregator is a pure function of its inputs: the runtime owns the
//! per-user records and feeds them through these hooks in event order.
use crate::config::WarConfig;
use crate::round::BattleRound;
use crate::types::{Side, UserId};
use crate::war::WarOutcome;

/// A user's lifetime record across all wars.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct UserWarStats {
    pub total_damage: u64,
    /// Wars whose winning side this user fought for.
    pub battles_won: u32,
    pub battles_lost: u32,
    pub rank: String,
    pub medals: u32,
    /// Snapshot of the strength used by the user's latest fight.
    pub current_strength: u32,
}

impl UserWarStats {
    pub fn new(rank: impl Into<String>, current_strength: u32) -> Self {
        Self {
            total_damage: 0,
            battles_won: 0,
            battles_lost: 0,
            rank: rank.into(),
            medals: 0,
            current_strength,
        }
    }

    /// Score the rank table is evaluated against.
    pub fn rank_score(&self, medal_weight: u64) -> u64 {
        self.total_damage
            .saturating_add(u64::from(self.medals).saturating_mul(medal_weight))
    }
}

/// One participant's result in a terminated war.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WarResult {
    pub user: UserId,
    pub side: Side,
    pub damage: u64,
    pub won: bool,
    pub medal: bool,
}

/// Folds contributions and war results into [`UserWarStats`].
#[derive(Clone, Copy, Debug)]
pub struct StatsAggregator<'a> {
    config: &'a WarConfig,
}

impl<'a> StatsAggregator<'a> {
    pub fn new(config: &'a WarConfig) -> Self {
        Self { config }
    }

    /// Stats of a user that has never fought.
    pub fn fresh(&self, current_strength: u32) -> UserWarStats {
        UserWarStats::new(self.config.rank_table.base_rank(), current_strength)
    }

    /// Credits one accepted contribution.
    pub fn on_contribution(&self, stats: &mut UserWarStats, damage: u64, strength: u32) {
        stats.total_damage = stats.total_damage.saturating_add(damage);
        stats.current_strength = strength;
        self.refresh_rank(stats);
    }

    /// Round wins are reported per war, not per user; closing a round leaves
    /// every user's record unchanged.
    pub fn on_round_closed(&self, _round: &BattleRound, _participants: &[UserId]) {}

    /// Decides each participant's result once a war terminates.
    ///
    /// `participants` is `(user, side, damage)` in order of first
    /// contribution. The participant on the winning side with the most
    /// damage earns a medal; an exact tie goes to whoever joined first.
    pub fn on_war_terminal(
        &self,
        outcome: &WarOutcome,
        participants: &[(UserId, Side, u64)],
    ) -> Vec<WarResult> {
        let mut medalist: Option<(UserId, u64)> = None;
        for &(user, side, damage) in participants {
            if side == outcome.winner
                && damage > 0
                && medalist.is_none_or(|(_, best)| damage > best)
            {
                medalist = Some((user, damage));
            }
        }

        participants
            .iter()
            .map(|&(user, side, damage)| WarResult {
                user,
                side,
                damage,
                won: side == outcome.winner,
                medal: medalist.is_some_and(|(winner, _)| winner == user),
            })
            .collect()
    }

    /// Applies one [`WarResult`] to the user's record.
    pub fn apply_result(&self, stats: &mut UserWarStats, result: &WarResult) {
        if result.won {
            stats.battles_won = stats.battles_won.saturating_add(1);
        } else {
            stats.battles_lost = stats.battles_lost.saturating_add(1);
        }
        if result.medal {
            stats.medals = stats.medals.saturating_add(1);
        }
        self.refresh_rank(stats);
    }

    fn refresh_rank(&self, stats: &mut UserWarStats) {
        let score = stats.rank_score(self.config.medal_weight);
        let rank = self.config.rank_table.rank_for(score);
        if stats.rank != rank {
            stats.rank = rank.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::DamageTotals;
    use crate::types::Timestamp;
    use crate::war::TerminationReason;

    fn outcome(winner: Side) -> WarOutcome {
        WarOutcome {
            winner,
            totals: DamageTotals::new(3_000, 1_000),
            attacker_percentage: 75.0,
            reason: TerminationReason::RoundLimit,
            rounds_fought: 11,
            attacker_rounds_won: 8,
            defender_rounds_won: 3,
            ended_at: Timestamp(0),
        }
    }

    #[test]
    fn contributions_accumulate_and_promote() {
        let config = WarConfig::default();
        let stats = StatsAggregator::new(&config);
        let mut record = stats.fresh(100);
        assert_eq!(record.rank, "Private");

        stats.on_contribution(&mut record, 9_999, 100);
        assert_eq!(record.rank, "Private");
        stats.on_contribution(&mut record, 1, 120);
        assert_eq!(record.rank, "Corporal");
        assert_eq!(record.total_damage, 10_000);
        assert_eq!(record.current_strength, 120);
    }

    #[test]
    fn top_winner_gets_the_only_medal() {
        let config = WarConfig::default();
        let stats = StatsAggregator::new(&config);
        let participants = [
            (UserId(1), Side::Attacker, 1_000),
            (UserId(2), Side::Attacker, 2_000),
            (UserId(3), Side::Attacker, 2_000),
            (UserId(4), Side::Defender, 5_000),
        ];

        let results = stats.on_war_terminal(&outcome(Side::Attacker), &participants);

        let medals: Vec<UserId> = results.iter().filter(|r| r.medal).map(|r| r.user).collect();
        assert_eq!(medals, vec![UserId(2)]);
        assert!(results[0].won);
        assert!(!results[3].won);
    }

    #[test]
    fn medals_feed_rank_score() {
        let config = WarConfig::default();
        let stats = StatsAggregator::new(&config);
        let mut record = stats.fresh(100);
        stats.on_contribution(&mut record, 5_000, 100);

        let result = WarResult {
            user: UserId(1),
            side: Side::Defender,
            damage: 5_000,
            won: true,
            medal: true,
        };
        stats.apply_result(&mut record, &result);

        assert_eq!(record.battles_won, 1);
        assert_eq!(record.medals, 1);
        // 5_000 damage + 25_000 for the medal.
        assert_eq!(record.rank_score(config.medal_weight), 30_000);
        assert_eq!(record.rank, "Corporal");

        let loss = WarResult {
            won: false,
            medal: false,
            ..result
        };
        stats.apply_result(&mut record, &loss);
        assert_eq!(record.battles_lost, 1);
    }
}
