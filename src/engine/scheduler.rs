//! # engine::scheduler
//!
//! Runs periodic tasks, each on its own Tokio task and its own
//! `interval_at(first, every)`, so a slow strategy fetch never delays an
//! alert check.
//!
//! A tick runs to completion before the loop looks at the stop signal
//! again; [`Scheduler::stop`] therefore returns only after every in-flight
//! tick has finished.  Ticks of one task never overlap: an overrunning tick
//! pushes the next one back (`MissedTickBehavior::Delay`).
//!
//! All timing goes through `tokio::time`, so tests drive the schedule with a
//! paused clock instead of real waiting.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::engine::{alerts::evaluate_alerts, strategy::evaluate_strategy};
use crate::error::EngineError;
use crate::state::SharedState;

#[async_trait]
pub trait PeriodicTask: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// One evaluation pass.  Failures are handled inside; a tick never
    /// brings the schedule down.
    async fn run_tick(&self);
}

/// Initial delay before the first tick, then the period between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub first: Duration,
    pub every: Duration,
}

pub struct Scheduler {
    stop_tx: watch::Sender<bool>,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self { stop_tx, handles: Vec::new() }
    }

    pub fn spawn(&mut self, task: Arc<dyn PeriodicTask>, cadence: Cadence) {
        let name = task.name();
        let stop_rx = self.stop_tx.subscribe();

        info!(task = name, first = ?cadence.first, every = ?cadence.every, "⏱️ Periodic task scheduled");
        let handle = tokio::spawn(run_periodic(task, cadence, stop_rx));
        self.handles.push((name, handle));
    }

    /// Signal every task to stop, then wait for in-flight ticks to finish.
    pub async fn stop(self) {
        self.stop_tx.send_replace(true);

        for (name, handle) in self.handles {
            if let Err(e) = handle.await {
                error!(task = name, error = %e, "Periodic task ended abnormally");
            }
        }
        info!("⏹️ Scheduler stopped");
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_periodic(task: Arc<dyn PeriodicTask>, cadence: Cadence, mut stop_rx: watch::Receiver<bool>) {
    let mut ticker = interval_at(Instant::now() + cadence.first, cadence.every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *stop_rx.borrow() {
            break;
        }

        tokio::select! {
            biased;

            changed = stop_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }

            _ = ticker.tick() => {
                debug!(task = task.name(), "Tick");
                task.run_tick().await;
            }
        }
    }

    debug!(task = task.name(), "Periodic task exited");
}

// ─── Engine tasks ─────────────────────────────────────────────────────────────

/// Alert evaluation as a periodic task.
pub struct AlertCheck(pub SharedState);

#[async_trait]
impl PeriodicTask for AlertCheck {
    fn name(&self) -> &'static str {
        "alert-check"
    }

    async fn run_tick(&self) {
        match evaluate_alerts(&self.0).await {
            Ok(_) => {}
            Err(EngineError::FeedUnavailable(reason)) => {
                warn!(%reason, "Price feed unavailable, alert tick skipped");
            }
            Err(e) => error!(error = %e, kind = e.kind(), "Alert tick failed"),
        }
    }
}

/// Strategy evaluation as a periodic task.
pub struct StrategyCheck(pub SharedState);

#[async_trait]
impl PeriodicTask for StrategyCheck {
    fn name(&self) -> &'static str {
        "strategy-check"
    }

    async fn run_tick(&self) {
        match evaluate_strategy(&self.0).await {
            Ok(outcome) => debug!(?outcome, "Strategy tick complete"),
            Err(EngineError::FeedUnavailable(reason)) => {
                warn!(%reason, "Price history unavailable, strategy tick skipped");
            }
            Err(e) => error!(error = %e, kind = e.kind(), "Strategy tick failed"),
        }
    }
}

/// Schedule both evaluators with the configured cadences.
pub fn start(state: &SharedState) -> Scheduler {
    let schedule = &state.config.schedule;
    let mut scheduler = Scheduler::new();

    scheduler.spawn(
        Arc::new(AlertCheck(state.clone())),
        Cadence { first: schedule.alert_first, every: schedule.alert_interval },
    );
    scheduler.spawn(
        Arc::new(StrategyCheck(state.clone())),
        Cadence { first: schedule.strategy_first, every: schedule.strategy_interval },
    );

    scheduler
}
