//! Shared fixtures for the runtime integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use conflict_runtime::{ConflictEngine, EngineConfig, ManualClock, RetryPolicy, StaticProfileOracle};
use war_core::{Belligerents, Timestamp, WarConfig};

/// War rules with no damage variance: strength 100 always deals 1000.
pub fn flat_rules(round_threshold: u64) -> WarConfig {
    WarConfig::default()
        .with_round_damage_threshold(round_threshold)
        .with_damage_variance(0)
        .with_decisive_share(None)
}

pub fn config(war: WarConfig) -> EngineConfig {
    EngineConfig {
        war,
        retry: RetryPolicy::new(3, Duration::from_millis(1)),
        ..EngineConfig::default()
    }
}

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Timestamp(1_000_000)))
}

pub fn engine(war: WarConfig, clock: Arc<ManualClock>) -> ConflictEngine {
    ConflictEngine::builder()
        .config(config(war))
        .oracle(StaticProfileOracle::with_default_strength(100))
        .clock(clock)
        .seed_entropy(7)
        .build()
        .expect("engine should build")
}

pub fn alsace() -> Belligerents {
    Belligerents::new("Germany", "France", "Alsace-Lorraine")
}
