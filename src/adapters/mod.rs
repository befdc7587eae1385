//! # adapters
//!
//! The engine's three outbound collaborators and their implementations.
//!
//! | Trait        | Real                                   | In-memory      |
//! |--------------|----------------------------------------|----------------|
//! | [`PriceFeed`] | [`alpaca::AlpacaClient`] (market data) | [`mock::MockFeed`]     |
//! | [`Brokerage`] | [`alpaca::AlpacaClient`] (trading)     | [`mock::MockBroker`]   |
//! | [`Notifier`]  | [`telegram::TelegramNotifier`]         | [`mock::MockNotifier`] |
//!
//! Every network call made by a real adapter carries a bounded timeout so a
//! stalled request cannot hold an evaluator tick forever.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

use crate::config::{BrokerMode, Config, NotifierMode};
use crate::error::{EngineError, EngineResult};
use crate::models::{AccountSnapshot, Destination, OrderAck, OrderRequest, PositionSnapshot};

pub mod alpaca;
pub mod mock;
pub mod telegram;

// ─── Traits ───────────────────────────────────────────────────────────────────

#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Most recent traded price of `symbol`.
    async fn latest_price(&self, symbol: &str) -> EngineResult<Decimal>;

    /// Up to `lookback_days` daily closes of `symbol`, oldest first.
    async fn daily_closes(&self, symbol: &str, lookback_days: usize) -> EngineResult<Vec<Decimal>>;
}

#[async_trait]
pub trait Brokerage: Send + Sync {
    async fn submit_order(&self, order: &OrderRequest) -> EngineResult<OrderAck>;

    async fn account(&self) -> EngineResult<AccountSnapshot>;

    /// `None` when no position in `symbol` is held.
    async fn position(&self, symbol: &str) -> EngineResult<Option<PositionSnapshot>>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, destination: &Destination, text: &str) -> EngineResult<()>;
}

// ─── Wiring ───────────────────────────────────────────────────────────────────

pub struct Adapters {
    pub feed:     Arc<dyn PriceFeed>,
    pub broker:   Arc<dyn Brokerage>,
    pub notifier: Arc<dyn Notifier>,
}

/// Build the collaborators selected by `config`, sharing one HTTP client.
pub fn build_adapters(config: &Config, client: reqwest::Client) -> EngineResult<Adapters> {
    let (feed, broker): (Arc<dyn PriceFeed>, Arc<dyn Brokerage>) = match config.broker {
        BrokerMode::Alpaca => {
            let alpaca_config = config.alpaca.clone().ok_or_else(|| {
                EngineError::Internal(anyhow::anyhow!("BROKER=alpaca without Alpaca credentials"))
            })?;
            let alpaca = Arc::new(alpaca::AlpacaClient::new(
                client.clone(),
                alpaca_config,
                config.request_timeout,
            ));
            info!("Using Alpaca brokerage and market data");
            let feed: Arc<dyn PriceFeed> = alpaca.clone();
            let broker: Arc<dyn Brokerage> = alpaca;
            (feed, broker)
        }
        BrokerMode::Mock => {
            info!(price = %config.mock_price, "🎭 Using MOCK brokerage and price feed");
            let feed: Arc<dyn PriceFeed> = Arc::new(mock::MockFeed::with_price(config.mock_price));
            let broker: Arc<dyn Brokerage> = Arc::new(mock::MockBroker::new(config.mock_price));
            (feed, broker)
        }
    };

    let notifier: Arc<dyn Notifier> = match (&config.notifier, &config.telegram_token) {
        (NotifierMode::Telegram, Some(token)) => Arc::new(telegram::TelegramNotifier::new(
            client,
            token.clone(),
            config.request_timeout,
        )),
        (NotifierMode::Telegram, None) => {
            return Err(EngineError::Internal(anyhow::anyhow!(
                "NOTIFIER=telegram without TELEGRAM_BOT_TOKEN"
            )))
        }
        (NotifierMode::Log, _) => Arc::new(mock::MockNotifier::new()),
    };

    Ok(Adapters { feed, broker, notifier })
}
