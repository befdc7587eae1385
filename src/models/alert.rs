//! # models::alert
//!
//! A threshold [`AlertCondition`] scoped to a [`Destination`].
//!
//! Conditions are immutable once registered.  Two conditions with the same
//! threshold and side are still distinct: identity is the [`AlertId`] handed
//! out by the registry in creation order.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Side;

// ─── Destination ──────────────────────────────────────────────────────────────

/// Opaque identifier of where alerts are scoped and notices are delivered
/// (a chat id, a user id, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Destination(String);

impl Destination {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── AlertCondition ───────────────────────────────────────────────────────────

/// Registry-assigned identity; strictly increasing in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCondition {
    pub id: AlertId,
    pub threshold: Decimal,
    pub side: Side,
    pub created_at: DateTime<Utc>,
}

impl AlertCondition {
    /// BUY fires at or below the threshold, SELL at or above it.
    #[inline]
    pub fn is_triggered_by(&self, price: Decimal) -> bool {
        match self.side {
            Side::Buy  => price <= self.threshold,
            Side::Sell => price >= self.threshold,
        }
    }
}
