//! # models::side
//!
//! [`Side`] is the direction of an order; [`Signal`] is the strategy's view of
//! the market, which additionally has a neutral state.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

// ─── Side ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    #[serde(alias = "buy", alias = "Buy")]
    Buy,
    #[serde(alias = "sell", alias = "Sell")]
    Sell,
}

impl Side {
    /// Upper-case label used in the ledger and in notifications.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy  => "BUY",
            Side::Sell => "SELL",
        }
    }

    /// Lower-case label expected by the brokerage API.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Side::Buy  => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy"  => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other  => Err(EngineError::InvalidInput(format!(
                "direction must be 'buy' or 'sell', got '{other}'"
            ))),
        }
    }
}

// ─── Signal ───────────────────────────────────────────────────────────────────

/// Output of the moving-average crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    #[default]
    None,
    Buy,
    Sell,
}

impl Signal {
    /// The order side this signal trades, if any.
    pub fn side(&self) -> Option<Side> {
        match self {
            Signal::None => None,
            Signal::Buy  => Some(Side::Buy),
            Signal::Sell => Some(Side::Sell),
        }
    }
}

impl From<Side> for Signal {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy  => Signal::Buy,
            Side::Sell => Signal::Sell,
        }
    }
}
