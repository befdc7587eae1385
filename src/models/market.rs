//! # models::market
//!
//! Payloads exchanged with the brokerage: the market order we submit and the
//! account / position snapshots it reports back.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Side;

/// A market order for the tracked instrument.
///
/// `client_order_id` lets the brokerage drop a duplicate submission of the
/// same order (network retry scenario).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    pub client_order_id: Uuid,
    pub symbol:          String,
    pub qty:             Decimal,
    pub side:            Side,
}

impl OrderRequest {
    pub fn market(symbol: &str, qty: Decimal, side: Side) -> Self {
        Self {
            client_order_id: Uuid::new_v4(),
            symbol:          symbol.to_string(),
            qty,
            side,
        }
    }
}

/// Brokerage acknowledgement of an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    pub status:   String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub equity:       Decimal,
    pub buying_power: Decimal,
    pub cash:         Decimal,
    pub status:       String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub symbol:       String,
    pub qty:          Decimal,
    pub market_value: Decimal,
}
