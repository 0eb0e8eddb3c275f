//! Read models handed to API consumers.
//!
//! Field names are camelCase on the wire to match the game's JSON API.
use core::time::Duration;

use serde::{Deserialize, Serialize};
use war_core::{
    BattleRound, RoundCloseReason, Side, TerminationReason, Timestamp, UserId, UserWarStats, War,
    WarId, WarOutcome, WarStatus,
};

/// Formats a remaining duration as `"{h}h {m}m"`.
pub fn format_time_left(remaining: Duration) -> String {
    let minutes = remaining.as_secs() / 60;
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// One war as listed to players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarView {
    pub id: WarId,
    pub attacker: String,
    pub defender: String,
    pub region: String,
    pub attacker_flag: Option<String>,
    pub defender_flag: Option<String>,
    pub attacker_damage: u64,
    pub defender_damage: u64,
    pub total_damage: u64,
    pub attacker_percentage: f64,
    pub participants: usize,
    pub time_left: String,
    pub status: WarStatus,
    pub active: bool,
    pub current_round: Option<u8>,
    pub battle_rounds: Vec<BattleRoundView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<WarOutcomeView>,
}

impl WarView {
    pub fn from_war(war: &War, now: Timestamp) -> Self {
        let totals = war.totals();
        let belligerents = war.belligerents();
        Self {
            id: war.id(),
            attacker: belligerents.attacker.clone(),
            defender: belligerents.defender.clone(),
            region: belligerents.region.clone(),
            attacker_flag: belligerents.attacker_flag.clone(),
            defender_flag: belligerents.defender_flag.clone(),
            attacker_damage: totals.attacker,
            defender_damage: totals.defender,
            total_damage: totals.total(),
            attacker_percentage: totals.attacker_percentage(),
            participants: war.participant_count(),
            time_left: format_time_left(war.time_remaining(now)),
            status: war.status(),
            active: !war.is_terminal(now),
            current_round: war.rounds().current_index(),
            battle_rounds: war
                .battle_rounds()
                .iter()
                .filter(|round| round.is_closed())
                .map(BattleRoundView::from)
                .collect(),
            outcome: war.outcome().map(WarOutcomeView::from),
        }
    }
}

/// A closed round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleRoundView {
    pub round: u8,
    pub winner: Option<Side>,
    /// Combined damage of both sides in this round.
    pub damage: u64,
    pub attacker_damage: u64,
    pub defender_damage: u64,
    pub close_reason: Option<RoundCloseReason>,
}

impl From<&BattleRound> for BattleRoundView {
    fn from(round: &BattleRound) -> Self {
        Self {
            round: round.index,
            winner: round.winner,
            damage: round.total_damage(),
            attacker_damage: round.damage.attacker,
            defender_damage: round.damage.defender,
            close_reason: round.close_reason,
        }
    }
}

/// Final result of a war.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarOutcomeView {
    pub winner: Side,
    pub attacker_percentage: f64,
    pub reason: TerminationReason,
    pub rounds_fought: usize,
    pub attacker_rounds_won: usize,
    pub defender_rounds_won: usize,
}

impl From<&WarOutcome> for WarOutcomeView {
    fn from(outcome: &WarOutcome) -> Self {
        Self {
            winner: outcome.winner,
            attacker_percentage: outcome.attacker_percentage,
            reason: outcome.reason,
            rounds_fought: outcome.rounds_fought,
            attacker_rounds_won: outcome.attacker_rounds_won,
            defender_rounds_won: outcome.defender_rounds_won,
        }
    }
}

/// A user's lifetime battle record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsView {
    pub user: UserId,
    pub total_damage: u64,
    pub battles_won: u32,
    pub battles_lost: u32,
    pub rank: String,
    pub medals: u32,
    pub current_strength: u32,
}

impl UserStatsView {
    pub fn new(user: UserId, stats: &UserWarStats) -> Self {
        Self {
            user,
            total_damage: stats.total_damage,
            battles_won: stats.battles_won,
            battles_lost: stats.battles_lost,
            rank: stats.rank.clone(),
            medals: stats.medals,
            current_strength: stats.current_strength,
        }
    }
}

/// Result of one accepted fight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FightResult {
    pub damage_dealt: u64,
    pub side: Side,
    /// e.g. "You fought for France and dealt 1043 damage!"
    pub message: String,
    /// The round this fight closed, if any.
    pub round_closed: Option<BattleRoundView>,
    /// Set when this fight ended the war.
    pub war_outcome: Option<WarOutcomeView>,
    pub war: WarView,
}

impl FightResult {
    pub fn message(country: &str, damage: u64) -> String {
        format!("You fought for {country} and dealt {damage} damage!")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use war_core::{Belligerents, WarConfig};

    #[test]
    fn time_left_is_hours_and_minutes() {
        assert_eq!(format_time_left(Duration::from_secs(0)), "0h 0m");
        assert_eq!(format_time_left(Duration::from_secs(59)), "0h 0m");
        assert_eq!(
            format_time_left(Duration::from_secs(3 * 3600 + 25 * 60 + 10)),
            "3h 25m"
        );
    }

    #[test]
    fn war_view_uses_camel_case_fields() {
        let war = War::new(
            WarId(3),
            Belligerents::new("Spain", "Portugal", "Porto").with_flags("ES", "PT"),
            Timestamp(0),
            1,
            &WarConfig::default(),
        );
        let view = WarView::from_war(&war, Timestamp(0));
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["attackerDamage"], 0);
        assert_eq!(json["attackerPercentage"], 50.0);
        assert_eq!(json["timeLeft"], "6h 0m");
        assert_eq!(json["attackerFlag"], "ES");
        assert_eq!(json["defenderFlag"], "PT");
        assert_eq!(json["status"], "balanced");
        assert_eq!(json["battleRounds"].as_array().unwrap().len(), 0);
        assert!(json.get("outcome").is_none());
    }

    #[test]
    fn fight_message_names_the_country() {
        assert_eq!(
            FightResult::message("France", 1043),
            "You fought for France and dealt 1043 damage!"
        );
    }
}
