//! # engine::executor
//!
//! **Trade Executor** — the single path every trade takes, whichever
//! component decided on it.
//!
//! ```text
//! build_order → Brokerage::submit_order ─ok→ TradeLedger::append → TRADE_EXECUTED
//!                                        └err→ TRADE_FAILED (nothing recorded)
//! ```
//!
//! The ledger is written only after the brokerage accepted the order.  A
//! ledger failure at that point is logged but does not turn the trade into a
//! failure: reporting it as one would make the caller re-submit an order that
//! is already live.

use std::sync::atomic::Ordering;

use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::error::EngineResult;
use crate::events::EngineEvent;
use crate::models::{OrderAck, OrderRequest, Side, TradeLedgerEntry, TradeReason};
use crate::state::AppState;

/// A trade the brokerage accepted.
#[derive(Debug, Clone)]
pub struct Execution {
    pub entry: TradeLedgerEntry,
    pub ack:   OrderAck,
}

/// Market order for the configured instrument and quantity.
pub fn build_order(state: &AppState, side: Side) -> OrderRequest {
    OrderRequest::market(&state.config.symbol, state.config.order_qty, side)
}

/// Submit a market order and, once accepted, record it in the ledger.
///
/// `price` is the price that motivated the trade; it is what the ledger
/// records, not the fill price.
pub async fn execute_trade(
    state:  &AppState,
    side:   Side,
    price:  Decimal,
    reason: TradeReason,
) -> EngineResult<Execution> {
    let order = build_order(state, side);

    let ack = match state.broker.submit_order(&order).await {
        Ok(ack) => ack,
        Err(e) => {
            warn!(
                side   = %side,
                %price,
                %reason,
                error  = %e,
                "❌ [EXECUTOR] Order not placed"
            );
            state.broadcast(&EngineEvent::TradeFailed {
                side,
                reason: reason.to_string(),
                error:  e.to_string(),
            });
            return Err(e);
        }
    };

    let entry = TradeLedgerEntry::new(side, &state.config.symbol, price, reason);
    if let Err(e) = state.ledger.append(&entry).await {
        error!(
            order_id = %ack.order_id,
            line     = %entry.to_line(),
            error    = %e,
            "🚨 [EXECUTOR] Order placed but ledger append failed"
        );
    }

    let total = state.trade_count.fetch_add(1, Ordering::Relaxed) + 1;
    info!(
        order_id    = %ack.order_id,
        status      = %ack.status,
        side        = %side,
        symbol      = %state.config.symbol,
        %price,
        %reason,
        trade_count = total,
        "✅ [EXECUTOR] Trade executed"
    );

    state.broadcast(&EngineEvent::TradeExecuted {
        entry:    Box::new(entry.clone()),
        order_id: ack.order_id.clone(),
    });

    Ok(Execution { entry, ack })
}
