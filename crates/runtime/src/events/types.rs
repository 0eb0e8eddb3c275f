//! Event types for different topics.

use serde::{Deserialize, Serialize};
use war_core::{BattleRound, Belligerents, Contribution, Timestamp, WarId, WarOutcome};

/// Events emitted for individual fight actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FightEvent {
    /// A fight was accepted and appended to the war's ledger.
    ContributionRecorded {
        contribution: Contribution,
        /// Strength the damage was rolled from.
        strength: u32,
    },
}

/// Events emitted when a round closes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RoundEvent {
    /// Emitted exactly once per round.
    RoundClosed { war: WarId, round: BattleRound },
}

/// War lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WarEvent {
    WarCreated {
        war: WarId,
        belligerents: Belligerents,
        deadline: Timestamp,
    },

    WarTerminated { war: WarId, outcome: WarOutcome },
}
