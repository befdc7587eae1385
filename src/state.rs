//! # state
//!
//! [`AppState`] — everything the evaluators and the Command Surface share.
//!
//! The alert registry and the strategy state each sit behind their own async
//! `Mutex`.  Evaluators copy what they need out of a guard and drop it before
//! any network call, so a command is never blocked behind a slow brokerage.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{info, warn};

use crate::adapters::{Adapters, Brokerage, Notifier, PriceFeed};
use crate::config::Config;
use crate::engine::retry::RetryGate;
use crate::events::EngineEvent;
use crate::ledger::TradeLedger;
use crate::models::{Destination, StrategyState};
use crate::registry::AlertRegistry;

/// Monitor events buffered per subscriber before it starts lagging.
const EVENT_BUFFER: usize = 256;

// ─── AppState ─────────────────────────────────────────────────────────────────

pub struct AppState {
    pub config: Config,

    // ── Engine state ──────────────────────────────────────────────────────────
    pub alerts:   Mutex<AlertRegistry>,
    pub strategy: Mutex<StrategyState>,
    pub ledger:   TradeLedger,
    pub retry:    RetryGate,

    // ── Collaborators ─────────────────────────────────────────────────────────
    pub feed:     Arc<dyn PriceFeed>,
    pub broker:   Arc<dyn Brokerage>,
    pub notifier: Arc<dyn Notifier>,

    // ── Monitor / lifecycle ───────────────────────────────────────────────────
    /// Pre-serialised [`EngineEvent`] JSON for WebSocket clients.
    pub broadcast_tx: broadcast::Sender<String>,
    shutdown_tx:      watch::Sender<bool>,
    pub started_at:   DateTime<Utc>,

    // ── Metrics ───────────────────────────────────────────────────────────────
    pub alert_ticks:    AtomicU64,
    pub strategy_ticks: AtomicU64,
    pub trade_count:    AtomicU64,
}

impl AppState {
    pub fn new(config: Config, adapters: Adapters) -> Self {
        let (broadcast_tx, _) = broadcast::channel(EVENT_BUFFER);
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            alerts:         Mutex::new(AlertRegistry::new()),
            strategy:       Mutex::new(StrategyState::default()),
            ledger:         TradeLedger::new(&config.ledger_path),
            retry:          RetryGate::new(config.retry.clone()),
            feed:           adapters.feed,
            broker:         adapters.broker,
            notifier:       adapters.notifier,
            broadcast_tx,
            shutdown_tx,
            started_at:     Utc::now(),
            alert_ticks:    AtomicU64::new(0),
            strategy_ticks: AtomicU64::new(0),
            trade_count:    AtomicU64::new(0),
            config,
        }
    }

    // ── Helper Methods ────────────────────────────────────────────────────────

    /// Send an event to every monitor client; a no-op when nobody listens.
    pub fn broadcast(&self, event: &EngineEvent) {
        let _ = self.broadcast_tx.send(event.to_json());
    }

    /// Deliver a notice, logging instead of failing when delivery breaks.
    pub async fn notify(&self, destination: &Destination, text: &str) {
        if let Err(e) = self.notifier.notify(destination, text).await {
            warn!(%destination, error = %e, "Notification not delivered");
        }
    }

    /// Where strategy notices go: whoever enabled it, else the configured default.
    pub async fn strategy_destination(&self) -> Option<Destination> {
        let notify_to = self.strategy.lock().await.notify_to.clone();
        notify_to.or_else(|| self.config.strategy_destination.clone())
    }

    pub fn request_shutdown(&self) {
        info!("🛑 Shutdown requested");
        self.shutdown_tx.send_replace(true);
    }

    /// Receiver that flips to `true` once shutdown has been requested.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    pub fn trades_executed(&self) -> u64 {
        self.trade_count.load(Ordering::Relaxed)
    }
}

pub type SharedState = Arc<AppState>;

pub fn build_state(config: Config, adapters: Adapters) -> SharedState {
    Arc::new(AppState::new(config, adapters))
}

// ─── Test harness ─────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::*;
    use crate::adapters::mock::{MockBroker, MockFeed, MockNotifier};
    use crate::ledger::temp_ledger_path;

    pub const ADMIN: &str = "admin-1";

    /// Shared state wired to in-memory collaborators the test can script.
    pub struct Harness {
        pub state:    SharedState,
        pub feed:     Arc<MockFeed>,
        pub broker:   Arc<MockBroker>,
        pub notifier: Arc<MockNotifier>,
    }

    pub fn harness(price: Decimal) -> Harness {
        harness_with(Config::default(), price)
    }

    pub fn harness_with(config: Config, price: Decimal) -> Harness {
        let config = Config {
            ledger_path: temp_ledger_path().to_string_lossy().into_owned(),
            admin_id:    Some(ADMIN.to_string()),
            ..config
        };

        let feed = Arc::new(MockFeed::with_price(price));
        let broker = Arc::new(MockBroker::new(price));
        let notifier = Arc::new(MockNotifier::new());

        let adapters = Adapters {
            feed:     feed.clone(),
            broker:   broker.clone(),
            notifier: notifier.clone(),
        };

        Harness { state: build_state(config, adapters), feed, broker, notifier }
    }
}
