//! Domain models shared across the whole engine.

pub mod alert;
pub mod market;
pub mod side;
pub mod strategy;
pub mod trade;

pub use alert::{AlertCondition, AlertId, Destination};
pub use market::{AccountSnapshot, OrderAck, OrderRequest, PositionSnapshot};
pub use side::{Side, Signal};
pub use strategy::StrategyState;
pub use trade::{cents, TradeLedgerEntry, TradeReason};
