//! # adapters::mock
//!
//! In-memory collaborators: a paper broker, a scriptable price feed and a
//! notifier that only logs.  `BROKER=mock` / `NOTIFIER=log` run the engine on
//! these without any external account; the unit tests script them directly.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::info;

use crate::adapters::{Brokerage, Notifier, PriceFeed};
use crate::error::{EngineError, EngineResult};
use crate::models::{AccountSnapshot, Destination, OrderAck, OrderRequest, PositionSnapshot, Side};

/// Paper account starting cash.
const PAPER_CASH: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

/// Notices kept in memory by [`MockNotifier`].
const NOTICE_HISTORY: usize = 256;

// ─── MockFeed ─────────────────────────────────────────────────────────────────

pub struct MockFeed {
    /// `None` = feed unavailable.
    price:          Mutex<Option<Decimal>>,
    /// Daily closes, oldest first.
    closes:         Mutex<Vec<Decimal>>,
    close_requests: AtomicU64,
}

impl MockFeed {
    /// A flat market: `price` now and for the last 30 sessions.
    pub fn with_price(price: Decimal) -> Self {
        Self {
            price:          Mutex::new(Some(price)),
            closes:         Mutex::new(vec![price; 30]),
            close_requests: AtomicU64::new(0),
        }
    }

    #[cfg(test)]
    pub fn unavailable() -> Self {
        Self {
            price:          Mutex::new(None),
            closes:         Mutex::new(Vec::new()),
            close_requests: AtomicU64::new(0),
        }
    }

    #[cfg(test)]
    pub async fn set_price(&self, price: Option<Decimal>) {
        *self.price.lock().await = price;
    }

    #[cfg(test)]
    pub async fn set_closes(&self, closes: Vec<Decimal>) {
        *self.closes.lock().await = closes;
    }

    #[cfg(test)]
    pub async fn push_close(&self, close: Decimal) {
        self.closes.lock().await.push(close);
    }

    #[cfg(test)]
    pub fn close_requests(&self) -> u64 {
        self.close_requests.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PriceFeed for MockFeed {
    async fn latest_price(&self, symbol: &str) -> EngineResult<Decimal> {
        self.price
            .lock()
            .await
            .ok_or_else(|| EngineError::FeedUnavailable(format!("no mock price for {symbol}")))
    }

    async fn daily_closes(&self, symbol: &str, lookback_days: usize) -> EngineResult<Vec<Decimal>> {
        self.close_requests.fetch_add(1, Ordering::Relaxed);

        let closes = self.closes.lock().await;
        if closes.is_empty() {
            return Err(EngineError::FeedUnavailable(format!("no mock closes for {symbol}")));
        }
        let skip = closes.len().saturating_sub(lookback_days);
        Ok(closes[skip..].to_vec())
    }
}

// ─── MockBroker ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct PaperBook {
    orders:    Vec<OrderRequest>,
    /// `Some(reason)` = reject every order with that reason.
    reject:    Option<String>,
    /// Per-order outcomes consumed in submission order before `reject`
    /// applies; `Some(reason)` rejects that one order.
    scripted:  VecDeque<Option<String>>,
    net_qty:   Decimal,
    mark:      Decimal,
}

/// Fills every market order instantly at the mark price, unless told to reject.
pub struct MockBroker {
    book:     Mutex<PaperBook>,
    next_id:  AtomicU64,
}

impl MockBroker {
    pub fn new(mark: Decimal) -> Self {
        Self {
            book:    Mutex::new(PaperBook { mark, ..PaperBook::default() }),
            next_id: AtomicU64::new(1),
        }
    }

    #[cfg(test)]
    pub async fn reject_orders(&self, reason: Option<&str>) {
        self.book.lock().await.reject = reason.map(str::to_string);
    }

    /// Decide the next orders one by one: `None` fills, `Some(reason)` rejects.
    #[cfg(test)]
    pub async fn script_orders<'a>(&self, outcomes: impl IntoIterator<Item = Option<&'a str>>) {
        self.book
            .lock()
            .await
            .scripted
            .extend(outcomes.into_iter().map(|o| o.map(str::to_string)));
    }

    #[cfg(test)]
    pub async fn submitted(&self) -> Vec<OrderRequest> {
        self.book.lock().await.orders.clone()
    }
}

#[async_trait]
impl Brokerage for MockBroker {
    async fn submit_order(&self, order: &OrderRequest) -> EngineResult<OrderAck> {
        let mut book = self.book.lock().await;

        let rejection = match book.scripted.pop_front() {
            Some(outcome) => outcome,
            None          => book.reject.clone(),
        };
        if let Some(reason) = rejection {
            return Err(EngineError::OrderRejected(reason));
        }

        book.net_qty += match order.side {
            Side::Buy  => order.qty,
            Side::Sell => -order.qty,
        };
        book.orders.push(order.clone());

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        info!(
            order_id = id,
            side     = %order.side,
            qty      = %order.qty,
            symbol   = %order.symbol,
            "🎭 [PAPER] Order filled"
        );

        Ok(OrderAck { order_id: format!("paper-{id}"), status: "filled".to_string() })
    }

    async fn account(&self) -> EngineResult<AccountSnapshot> {
        let book = self.book.lock().await;
        let cash = PAPER_CASH - book.net_qty * book.mark;

        Ok(AccountSnapshot {
            equity:       PAPER_CASH,
            buying_power: cash,
            cash,
            status:       "PAPER".to_string(),
        })
    }

    async fn position(&self, symbol: &str) -> EngineResult<Option<PositionSnapshot>> {
        let book = self.book.lock().await;
        if book.net_qty.is_zero() {
            return Ok(None);
        }

        Ok(Some(PositionSnapshot {
            symbol:       symbol.to_string(),
            qty:          book.net_qty,
            market_value: book.net_qty * book.mark,
        }))
    }
}

// ─── MockNotifier ─────────────────────────────────────────────────────────────

/// Logs every notice and keeps the most recent ones in memory.
pub struct MockNotifier {
    sent:    Mutex<VecDeque<(Destination, String)>>,
    failing: AtomicBool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            sent:    Mutex::new(VecDeque::with_capacity(NOTICE_HISTORY)),
            failing: AtomicBool::new(false),
        }
    }

    /// While set, every delivery errors and nothing is recorded.
    #[cfg(test)]
    pub fn fail_deliveries(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub async fn messages_for(&self, destination: &Destination) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(d, _)| d == destination)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, destination: &Destination, text: &str) -> EngineResult<()> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(EngineError::Internal(anyhow::anyhow!("notifier offline")));
        }
        info!(%destination, text, "📨 Notification");

        let mut sent = self.sent.lock().await;
        if sent.len() >= NOTICE_HISTORY {
            sent.pop_front();
        }
        sent.push_back((destination.clone(), text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn paper_broker_tracks_net_position() {
        let broker = MockBroker::new(dec!(250));
        assert_eq!(broker.position("TSLA").await.unwrap(), None);

        broker.submit_order(&OrderRequest::market("TSLA", dec!(1), Side::Buy)).await.unwrap();
        broker.submit_order(&OrderRequest::market("TSLA", dec!(1), Side::Buy)).await.unwrap();
        broker.submit_order(&OrderRequest::market("TSLA", dec!(1), Side::Sell)).await.unwrap();

        let position = broker.position("TSLA").await.unwrap().unwrap();
        assert_eq!(position.qty, dec!(1));
        assert_eq!(position.market_value, dec!(250));

        let account = broker.account().await.unwrap();
        assert_eq!(account.cash, dec!(99750));
        assert_eq!(broker.submitted().await.len(), 3);
    }

    #[tokio::test]
    async fn rejecting_broker_records_nothing() {
        let broker = MockBroker::new(dec!(250));
        broker.reject_orders(Some("insufficient buying power")).await;

        let err = broker
            .submit_order(&OrderRequest::market("TSLA", dec!(1), Side::Buy))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::OrderRejected(ref r) if r == "insufficient buying power"));
        assert!(broker.submitted().await.is_empty());
    }

    #[tokio::test]
    async fn scripted_outcomes_apply_in_order() {
        let broker = MockBroker::new(dec!(250));
        broker.script_orders([Some("halted"), None]).await;

        let order = OrderRequest::market("TSLA", dec!(1), Side::Buy);
        assert!(matches!(
            broker.submit_order(&order).await,
            Err(EngineError::OrderRejected(ref r)) if r == "halted"
        ));
        assert!(broker.submit_order(&order).await.is_ok());
        assert!(broker.submit_order(&order).await.is_ok());
        assert_eq!(broker.submitted().await.len(), 2);
    }

    #[tokio::test]
    async fn failing_notifier_records_nothing() {
        let notifier = MockNotifier::new();
        let dest = Destination::new("D1");
        notifier.fail_deliveries(true);
        assert!(notifier.notify(&dest, "hello").await.is_err());

        notifier.fail_deliveries(false);
        notifier.notify(&dest, "again").await.unwrap();
        assert_eq!(notifier.messages_for(&dest).await, vec!["again".to_string()]);
    }

    #[tokio::test]
    async fn feed_serves_trailing_window() {
        let feed = MockFeed::with_price(dec!(10));
        feed.set_closes((1..=40).map(Decimal::from).collect()).await;

        let closes = feed.daily_closes("TSLA", 30).await.unwrap();
        assert_eq!(closes.len(), 30);
        assert_eq!(closes.first(), Some(&dec!(11)));
        assert_eq!(closes.last(), Some(&dec!(40)));

        feed.set_price(None).await;
        assert!(matches!(feed.latest_price("TSLA").await, Err(EngineError::FeedUnavailable(_))));
        assert!(matches!(
            MockFeed::unavailable().daily_closes("TSLA", 30).await,
            Err(EngineError::FeedUnavailable(_))
        ));
    }
}
