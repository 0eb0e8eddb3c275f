//! Demo skirmish: simulated soldiers fighting the classic wars concurrently.
use conflict_runtime::{ConflictEngine, RuntimeError, StaticProfileOracle};
use tokio::task::JoinSet;
use tracing::{info, warn};
use war_core::{Belligerents, Side, UserId, WarId};

use crate::config::SkirmishConfig;

/// A simulated player.
#[derive(Clone, Copy, Debug)]
pub struct Soldier {
    pub id: UserId,
    pub name: &'static str,
    pub strength: u32,
}

pub const ROSTER: [Soldier; 8] = [
    soldier(1, "hans", 140),
    soldier(2, "amelie", 120),
    soldier(3, "giulia", 95),
    soldier(4, "luca", 110),
    soldier(5, "pablo", 130),
    soldier(6, "ines", 100),
    soldier(7, "klaus", 80),
    soldier(8, "chloe", 150),
];

const fn soldier(id: u64, name: &'static str, strength: u32) -> Soldier {
    Soldier {
        id: UserId(id),
        name,
        strength,
    }
}

/// The three wars every fresh world starts with.
pub fn demo_wars() -> [Belligerents; 3] {
    [
        Belligerents::new("Germany", "France", "Alsace-Lorraine").with_flags("🇩🇪", "🇫🇷"),
        Belligerents::new("Italy", "Switzerland", "Ticino").with_flags("🇮🇹", "🇨🇭"),
        Belligerents::new("Spain", "Portugal", "Porto").with_flags("🇪🇸", "🇵🇹"),
    ]
}

/// Profile service answering for the roster.
pub fn roster_oracle() -> StaticProfileOracle {
    let oracle = StaticProfileOracle::new();
    for soldier in &ROSTER {
        oracle.set_strength(soldier.id, soldier.strength);
    }
    oracle
}

/// Which war and side a soldier joins.
///
/// Soldiers are dealt round-robin over `wars`; every other pass switches
/// sides so each war gets both attackers and defenders.
pub fn assignment(index: usize, wars: &[WarId]) -> Option<(WarId, Side)> {
    let war = *wars.get(index % wars.len().max(1))?;
    let side = if (index / wars.len()) % 2 == 0 {
        Side::Attacker
    } else {
        Side::Defender
    };
    Some((war, side))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SkirmishReport {
    pub accepted: u32,
    pub rejected: u32,
}

/// Runs every soldier as its own task and waits for all of them.
pub async fn run(
    engine: &ConflictEngine,
    wars: &[WarId],
    config: &SkirmishConfig,
) -> Result<SkirmishReport, RuntimeError> {
    let mut tasks = JoinSet::new();
    for (index, soldier) in ROSTER.iter().copied().enumerate() {
        let Some((war, side)) = assignment(index, wars) else {
            continue;
        };
        let engine = engine.clone();
        let config = config.clone();
        tasks.spawn(fight_on(engine, soldier, war, side, config));
    }

    let mut report = SkirmishReport::default();
    while let Some(joined) = tasks.join_next().await {
        let soldier = joined.map_err(RuntimeError::WorkerJoin)?;
        report.accepted += soldier.accepted;
        report.rejected += soldier.rejected;
    }
    Ok(report)
}

async fn fight_on(
    engine: ConflictEngine,
    soldier: Soldier,
    war: WarId,
    side: Side,
    config: SkirmishConfig,
) -> SkirmishReport {
    let mut report = SkirmishReport::default();
    for _ in 0..config.fights_per_soldier {
        match engine.fight(war, soldier.id, side.as_ref()).await {
            Ok(result) => {
                report.accepted += 1;
                info!(soldier = soldier.name, war = %war, "{}", result.message);
                if let Some(outcome) = &result.war_outcome {
                    info!(war = %war, winner = %outcome.winner, "war is over");
                }
            }
            Err(RuntimeError::WarClosed(_)) => {
                report.rejected += 1;
                break;
            }
            Err(err) => {
                report.rejected += 1;
                warn!(soldier = soldier.name, war = %war, error = %err, "{}", err.reason());
            }
        }
        tokio::time::sleep(config.pace).await;
    }
    report
}
