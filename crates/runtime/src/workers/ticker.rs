//! Background battle tick.
//!
//! Rounds close on time and wars expire even when nobody fights, so a
//! worker drives [`ConflictEngine::tick`] on a fixed interval.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::api::{Result, RuntimeError};
use crate::engine::ConflictEngine;

/// Background task that ticks every war.
pub struct TickWorker {
    engine: ConflictEngine,
    interval: Duration,
    shutdown_rx: watch::Receiver<bool>,
}

impl TickWorker {
    pub fn new(
        engine: ConflictEngine,
        interval: Duration,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            engine,
            interval,
            shutdown_rx,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval = ?self.interval, "tick worker started");

        loop {
            tokio::select! {
                _ = interval.tick() => self.tick_once().await,
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("tick worker stopped");
    }

    async fn tick_once(&self) {
        let now = self.engine.now();
        match self.engine.tick(now).await {
            Ok(report) if report.rounds_closed > 0 || !report.wars_ended.is_empty() => {
                debug!(
                    rounds_closed = report.rounds_closed,
                    wars_ended = report.wars_ended.len(),
                    "battle tick settled wars"
                );
            }
            Ok(_) => {}
            Err(err) => error!(error = %err, "battle tick failed"),
        }
    }
}

/// Owner of a running [`TickWorker`].
pub struct TickerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl TickerHandle {
    pub(crate) fn spawn(engine: ConflictEngine, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = TickWorker::new(engine, interval, shutdown_rx);
        let join = tokio::spawn(worker.run());
        Self { shutdown_tx, join }
    }

    /// Stops the worker and waits for it to finish its current tick.
    pub async fn shutdown(self) -> Result<()> {
        // The worker may already be gone; joining still reports how it ended.
        let _ = self.shutdown_tx.send(true);
        self.join.await.map_err(RuntimeError::WorkerJoin)
    }
}
