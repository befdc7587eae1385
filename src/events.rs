//! # events
//!
//! [`EngineEvent`] — everything the engine broadcasts to monitor clients.
//!
//! Events go out over `tokio::sync::broadcast::Sender<String>` as
//! pre-serialised JSON, so slow or absent subscribers never hold up a tick.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{AlertCondition, AlertId, Destination, Side, Signal, TradeLedgerEntry};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineEvent {
    AlertSet {
        destination: Destination,
        alert:       AlertCondition,
    },

    AlertsCleared {
        destination: Destination,
        removed:     usize,
    },

    /// A condition matched and its order went through; it is now retired.
    AlertTriggered {
        destination: Destination,
        alert_id:    AlertId,
        price:       Decimal,
    },

    TradeExecuted {
        entry:    Box<TradeLedgerEntry>,
        order_id: String,
    },

    /// Brokerage refused or never received the order.
    TradeFailed {
        side:   Side,
        reason: String,
        error:  String,
    },

    StrategyToggled {
        enabled: bool,
    },

    StrategySignal {
        signal:   Signal,
        short_ma: Decimal,
        long_ma:  Decimal,
        price:    Decimal,
    },
}

impl EngineEvent {
    #[inline]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"event":"SERIALIZATION_ERROR"}"#.to_string())
    }
}
