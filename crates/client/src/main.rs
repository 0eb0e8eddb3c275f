//! Conflict engine demo client.
//!
//! Composition root: loads configuration, installs logging, builds the
//! engine with its background tick and plays a short skirmish over the
//! classic wars.
mod config;
mod dirs;
mod logging;
mod skirmish;

use std::sync::Arc;

use anyhow::{Context, Result};
use conflict_runtime::{ConflictEngine, FileContributionLog};

use crate::config::ClientConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = ClientConfig::from_env();
    logging::setup_logging(&config.logging)?;

    tracing::info!("Starting conflict engine");
    tracing::debug!(?config, "configuration loaded");

    let mut builder = ConflictEngine::builder()
        .config(config.engine.clone())
        .oracle(skirmish::roster_oracle());
    if config.audit_log {
        let path = dirs::data_dir().join("contributions.jsonl");
        let log = FileContributionLog::open(&path)
            .with_context(|| format!("Failed to open audit log: {}", path.display()))?;
        tracing::info!("Audit log: {}", path.display());
        builder = builder.repository(Arc::new(log));
    }
    let engine = builder.build()?;
    let ticker = engine.spawn_ticker();

    let mut wars = Vec::new();
    for belligerents in skirmish::demo_wars() {
        wars.push(engine.create_war(belligerents)?.id);
    }

    let report = skirmish::run(&engine, &wars, &config.skirmish).await?;
    tracing::info!(
        accepted = report.accepted,
        rejected = report.rejected,
        "Skirmish finished"
    );

    let active = engine.list_active_wars(engine.now()).await?;
    tracing::info!("Active wars:\n{}", serde_json::to_string_pretty(&active)?);

    for soldier in skirmish::ROSTER {
        let stats = engine.user_stats(soldier.id).await?;
        tracing::info!(soldier = soldier.name, "{}", serde_json::to_string(&stats)?);
    }

    ticker.shutdown().await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
