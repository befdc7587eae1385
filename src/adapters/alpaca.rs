//! # adapters::alpaca
//!
//! Alpaca REST client — implements both [`Brokerage`] (trading API) and
//! [`PriceFeed`] (market data API).
//!
//! ## API contract
//! ```text
//! POST {base}/v2/orders                      → { "id": "...", "status": "accepted", ... }
//! GET  {base}/v2/account                     → { "equity": "...", "buying_power": "...", ... }
//! GET  {base}/v2/positions/{symbol}          → { "qty": "...", "market_value": "..." } | 404
//! GET  {data}/v2/stocks/{symbol}/trades/latest → { "trade": { "p": 249.5, ... } }
//! GET  {data}/v2/stocks/{symbol}/bars        → { "bars": [ { "c": 249.5, ... } ] }
//! ```
//! Alpaca returns most decimals as JSON strings; `rust_decimal` accepts both.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::adapters::{Brokerage, PriceFeed};
use crate::config::AlpacaConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{AccountSnapshot, OrderAck, OrderRequest, PositionSnapshot};

pub struct AlpacaClient {
    client:  reqwest::Client,
    config:  AlpacaConfig,
    timeout: Duration,
}

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AlpacaOrderBody<'a> {
    symbol:          &'a str,
    qty:             String,
    side:            &'static str,
    #[serde(rename = "type")]
    order_type:      &'static str,
    time_in_force:   &'static str,
    client_order_id: String,
}

#[derive(Debug, Deserialize)]
struct AlpacaOrderResponse {
    id:     String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct AlpacaErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlpacaLatestTrade {
    trade: AlpacaTrade,
}

#[derive(Debug, Deserialize)]
struct AlpacaTrade {
    #[serde(rename = "p")]
    price: Decimal,
}

#[derive(Debug, Deserialize)]
struct AlpacaBars {
    #[serde(default)]
    bars: Option<Vec<AlpacaBar>>,
}

#[derive(Debug, Deserialize)]
struct AlpacaBar {
    #[serde(rename = "c")]
    close: Decimal,
}

// ─── Client ───────────────────────────────────────────────────────────────────

impl AlpacaClient {
    pub fn new(client: reqwest::Client, config: AlpacaConfig, timeout: Duration) -> Self {
        Self { client, config, timeout }
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("APCA-API-KEY-ID", &self.config.api_key)
            .header("APCA-API-SECRET-KEY", &self.config.secret_key)
            .timeout(self.timeout)
    }

    /// Pull Alpaca's `message` out of an error body, falling back to the raw text.
    async fn error_text(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<AlpacaErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or(body);
        format!("HTTP {status}: {message}")
    }
}

#[async_trait]
impl Brokerage for AlpacaClient {
    async fn submit_order(&self, order: &OrderRequest) -> EngineResult<OrderAck> {
        let url = format!("{}/v2/orders", self.config.base_url);
        let body = AlpacaOrderBody {
            symbol:          &order.symbol,
            qty:             order.qty.to_string(),
            side:            order.side.as_api_str(),
            order_type:      "market",
            time_in_force:   "gtc",
            client_order_id: order.client_order_id.to_string(),
        };

        info!(
            symbol          = %order.symbol,
            side            = %order.side,
            qty             = %order.qty,
            client_order_id = %order.client_order_id,
            "🚀 [ALPACA] Submitting market order"
        );

        let response = self
            .client
            .post(&url)
            .header("APCA-API-KEY-ID", &self.config.api_key)
            .header("APCA-API-SECRET-KEY", &self.config.secret_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Alpaca unreachable");
                EngineError::OrderRejected(format!("brokerage unreachable: {e}"))
            })?;

        if !response.status().is_success() {
            let msg = Self::error_text(response).await;
            warn!(%msg, "Alpaca rejected the order");
            return Err(EngineError::OrderRejected(msg));
        }

        let ack: AlpacaOrderResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Alpaca order response parse failed");
            EngineError::OrderRejected(format!("unreadable order response: {e}"))
        })?;

        info!(order_id = %ack.id, status = %ack.status, "✅ [ALPACA] Order accepted");
        Ok(OrderAck { order_id: ack.id, status: ack.status })
    }

    async fn account(&self) -> EngineResult<AccountSnapshot> {
        let response = self
            .get(format!("{}/v2/account", self.config.base_url))
            .send()
            .await
            .map_err(|e| EngineError::BrokerUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EngineError::BrokerUnavailable(Self::error_text(response).await));
        }

        response
            .json::<AccountSnapshot>()
            .await
            .map_err(|e| EngineError::BrokerUnavailable(format!("unreadable account: {e}")))
    }

    async fn position(&self, symbol: &str) -> EngineResult<Option<PositionSnapshot>> {
        let response = self
            .get(format!("{}/v2/positions/{symbol}", self.config.base_url))
            .send()
            .await
            .map_err(|e| EngineError::BrokerUnavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(EngineError::BrokerUnavailable(Self::error_text(response).await));
        }

        response
            .json::<PositionSnapshot>()
            .await
            .map(Some)
            .map_err(|e| EngineError::BrokerUnavailable(format!("unreadable position: {e}")))
    }
}

#[async_trait]
impl PriceFeed for AlpacaClient {
    async fn latest_price(&self, symbol: &str) -> EngineResult<Decimal> {
        let url = format!("{}/v2/stocks/{symbol}/trades/latest", self.config.data_url);

        let response = self
            .get(url)
            .query(&[("feed", "iex")])
            .send()
            .await
            .map_err(|e| EngineError::FeedUnavailable(format!("market data unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(EngineError::FeedUnavailable(Self::error_text(response).await));
        }

        let latest: AlpacaLatestTrade = response
            .json()
            .await
            .map_err(|e| EngineError::FeedUnavailable(format!("unreadable latest trade: {e}")))?;

        debug!(symbol, price = %latest.trade.price, "Latest trade fetched");
        Ok(latest.trade.price)
    }

    async fn daily_closes(&self, symbol: &str, lookback_days: usize) -> EngineResult<Vec<Decimal>> {
        let url = format!("{}/v2/stocks/{symbol}/bars", self.config.data_url);
        // Weekends and holidays: ask for twice the span in calendar days.
        let start = Utc::now() - chrono::Duration::days(lookback_days as i64 * 2);
        let start = start.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

        let response = self
            .get(url)
            .query(&[
                ("timeframe", "1Day"),
                ("start", start.as_str()),
                ("limit", "1000"),
                ("feed", "iex"),
            ])
            .send()
            .await
            .map_err(|e| EngineError::FeedUnavailable(format!("market data unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(EngineError::FeedUnavailable(Self::error_text(response).await));
        }

        let bars: AlpacaBars = response
            .json()
            .await
            .map_err(|e| EngineError::FeedUnavailable(format!("unreadable bars: {e}")))?;

        let mut closes: Vec<Decimal> = bars
            .bars
            .unwrap_or_default()
            .into_iter()
            .map(|bar| bar.close)
            .collect();

        if closes.is_empty() {
            return Err(EngineError::FeedUnavailable(format!("no daily bars for {symbol}")));
        }
        if closes.len() > lookback_days {
            closes.drain(..closes.len() - lookback_days);
        }

        debug!(symbol, count = closes.len(), "Daily closes fetched");
        Ok(closes)
    }
}
