//! # commands
//!
//! The Command Surface: every operation a caller can request, independent of
//! transport.  Each returns `EngineResult` and leaves state untouched on
//! error; the HTTP layer in [`crate::routes`] only maps arguments and results.

use std::sync::atomic::Ordering;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::engine::executor::{execute_trade, Execution};
use crate::error::{EngineError, EngineResult};
use crate::events::EngineEvent;
use crate::models::{
    AccountSnapshot, AlertCondition, Destination, PositionSnapshot, Side, Signal, StrategyState,
    TradeLedgerEntry, TradeReason,
};
use crate::state::AppState;

/// Ledger entries returned by `show_logs`.
pub const LOG_TAIL: usize = 10;

/// Counters for dashboards and health checks.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub symbol:           String,
    pub alert_ticks:      u64,
    pub strategy_ticks:   u64,
    pub trade_count:      u64,
    pub pending_alerts:   usize,
    pub pending_retries:  usize,
    pub strategy_enabled: bool,
    pub last_signal:      Signal,
    pub uptime_secs:      i64,
}

impl AppState {
    // ── Alerts ────────────────────────────────────────────────────────────────

    pub async fn set_alert(
        &self,
        destination: &Destination,
        price: Decimal,
        side: Side,
    ) -> EngineResult<AlertCondition> {
        let alert = self.alerts.lock().await.add_alert(destination, price, side)?;

        info!(%destination, alert_id = alert.id.0, %side, %price, "🔔 Alert set");
        self.broadcast(&EngineEvent::AlertSet {
            destination: destination.clone(),
            alert:       alert.clone(),
        });
        Ok(alert)
    }

    pub async fn list_alerts(&self, destination: &Destination) -> Vec<AlertCondition> {
        self.alerts.lock().await.list_alerts(destination).to_vec()
    }

    pub async fn clear_alerts(&self, destination: &Destination) -> usize {
        let removed = self.alerts.lock().await.clear_alerts(destination);

        info!(%destination, removed, "🧹 Alerts cleared");
        self.broadcast(&EngineEvent::AlertsCleared { destination: destination.clone(), removed });
        removed
    }

    // ── Strategy ──────────────────────────────────────────────────────────────

    /// Enable the strategy; `notify_to` (when given) receives its notices.
    pub async fn strategy_on(&self, notify_to: Option<Destination>) -> StrategyState {
        let snapshot = {
            let mut strategy = self.strategy.lock().await;
            strategy.enabled = true;
            if notify_to.is_some() {
                strategy.notify_to = notify_to;
            }
            strategy.clone()
        };

        info!(notify_to = ?snapshot.notify_to, "📈 Moving average strategy ENABLED");
        self.broadcast(&EngineEvent::StrategyToggled { enabled: true });
        snapshot
    }

    pub async fn strategy_off(&self) -> StrategyState {
        let snapshot = {
            let mut strategy = self.strategy.lock().await;
            strategy.enabled = false;
            strategy.clone()
        };

        info!("⏹ Moving average strategy DISABLED");
        self.broadcast(&EngineEvent::StrategyToggled { enabled: false });
        snapshot
    }

    pub async fn strategy_status(&self) -> StrategyState {
        self.strategy.lock().await.clone()
    }

    // ── Trading ───────────────────────────────────────────────────────────────

    /// Market order at the caller's request, ledgered at the current price.
    pub async fn manual_trade(&self, side: Side) -> EngineResult<Execution> {
        let price = self.quote().await?;
        execute_trade(self, side, price, TradeReason::ManualTrade).await
    }

    /// The most recent ledger entries; privileged.
    pub async fn show_logs(&self, caller: Option<&str>) -> EngineResult<Vec<TradeLedgerEntry>> {
        self.authorize(caller, "showLogs")?;
        self.ledger.tail(LOG_TAIL).await
    }

    // ── Market / account ──────────────────────────────────────────────────────

    pub async fn quote(&self) -> EngineResult<Decimal> {
        self.feed.latest_price(&self.config.symbol).await
    }

    pub async fn account(&self) -> EngineResult<AccountSnapshot> {
        self.broker.account().await
    }

    pub async fn position(&self) -> EngineResult<Option<PositionSnapshot>> {
        self.broker.position(&self.config.symbol).await
    }

    pub async fn stats(&self) -> EngineStats {
        let (strategy_enabled, last_signal) = {
            let strategy = self.strategy.lock().await;
            (strategy.enabled, strategy.last_signal)
        };

        EngineStats {
            symbol:           self.config.symbol.clone(),
            alert_ticks:      self.alert_ticks.load(Ordering::Relaxed),
            strategy_ticks:   self.strategy_ticks.load(Ordering::Relaxed),
            trade_count:      self.trades_executed(),
            pending_alerts:   self.alerts.lock().await.pending_count(),
            pending_retries:  self.retry.pending().await,
            strategy_enabled,
            last_signal,
            uptime_secs:      (Utc::now() - self.started_at).num_seconds(),
        }
    }

    // ── Admin ─────────────────────────────────────────────────────────────────

    /// Ask the process to stop; in-flight ticks finish first.
    pub fn admin_stop(&self, caller: Option<&str>) -> EngineResult<()> {
        self.authorize(caller, "stop")?;
        self.request_shutdown();
        Ok(())
    }

    /// Drop every alert and return the strategy to disabled / NONE.
    /// Returns how many alerts were dropped.
    pub async fn admin_reset(&self, caller: Option<&str>) -> EngineResult<usize> {
        self.authorize(caller, "reset")?;

        let cleared = self.alerts.lock().await.clear_all();
        {
            let mut strategy = self.strategy.lock().await;
            let generation = strategy.generation + 1;
            *strategy = StrategyState { generation, ..StrategyState::default() };
        }
        self.retry.clear().await;

        info!(cleared, "♻️ Engine memory reset");
        self.broadcast(&EngineEvent::StrategyToggled { enabled: false });
        Ok(cleared)
    }

    fn authorize(&self, caller: Option<&str>, command: &str) -> EngineResult<()> {
        match (&self.config.admin_id, caller) {
            (Some(admin), Some(caller)) if admin == caller => Ok(()),
            _ => {
                warn!(?caller, command, "🚫 Privileged command refused");
                Err(EngineError::Unauthorized(format!("{command} is restricted to the admin")))
            }
        }
    }
}
