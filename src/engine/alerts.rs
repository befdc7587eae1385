//! # engine::alerts
//!
//! **Alert Evaluator** — one pass over every pending threshold condition.
//!
//! ## Order of work (every tick)
//! ```text
//! 1. Fetch the instrument price          → FeedUnavailable skips the tick
//! 2. Snapshot the registry, drop the lock
//! 3. Per destination, per condition (insertion order):
//!    a. price crossed the threshold?
//!    b. still registered?                → a clear during the tick cancels it
//!    c. retry backoff elapsed?
//!    d. execute → notify → mark for removal   (failure: notify, keep it)
//! 4. Retire the destination's fired conditions by id
//! ```
//! A condition is only evaluated while present and is retired in the tick it
//! fires, so it can never produce a second order.

use std::collections::HashSet;
use std::sync::atomic::Ordering;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::engine::executor::execute_trade;
use crate::engine::retry::RetryKey;
use crate::error::EngineResult;
use crate::events::EngineEvent;
use crate::models::{cents, AlertCondition, AlertId, Destination, TradeReason};
use crate::state::AppState;

/// What one alert tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertTickReport {
    pub price:    Decimal,
    /// Orders placed; their conditions are gone.
    pub fired:    usize,
    /// Orders refused; their conditions stay armed.
    pub failed:   usize,
    /// Crossed conditions still waiting out a retry backoff.
    pub deferred: usize,
}

pub async fn evaluate_alerts(state: &AppState) -> EngineResult<AlertTickReport> {
    state.alert_ticks.fetch_add(1, Ordering::Relaxed);

    let symbol = &state.config.symbol;
    let price = state.feed.latest_price(symbol).await?;
    let snapshot = state.alerts.lock().await.snapshot();

    let mut report = AlertTickReport { price, ..AlertTickReport::default() };
    if snapshot.is_empty() {
        debug!(%price, "No pending alerts");
        return Ok(report);
    }

    for (destination, conditions) in snapshot {
        let mut fired: Vec<AlertId> = Vec::new();

        for condition in conditions.iter().filter(|c| c.is_triggered_by(price)) {
            match fire_condition(state, &destination, condition, price).await {
                Fire::Placed   => {
                    fired.push(condition.id);
                    report.fired += 1;
                }
                Fire::Failed   => report.failed += 1,
                Fire::Deferred => report.deferred += 1,
                Fire::Gone     => {}
            }
        }

        if !fired.is_empty() {
            let removed = state.alerts.lock().await.remove_triggered(&destination, &fired);
            debug!(%destination, removed, "Fired alerts retired");
        }
    }

    let live: HashSet<AlertId> = state
        .alerts
        .lock()
        .await
        .snapshot()
        .into_iter()
        .flat_map(|(_, conditions)| conditions.into_iter().map(|c| c.id))
        .collect();
    state.retry.prune_alerts(|id| live.contains(&id)).await;

    info!(
        %price,
        fired    = report.fired,
        failed   = report.failed,
        deferred = report.deferred,
        "🔔 Alert tick complete"
    );
    Ok(report)
}

enum Fire {
    Placed,
    Failed,
    Deferred,
    /// Cleared while the tick was running.
    Gone,
}

async fn fire_condition(
    state:       &AppState,
    destination: &Destination,
    condition:   &AlertCondition,
    price:       Decimal,
) -> Fire {
    if !state.alerts.lock().await.contains(destination, condition.id) {
        debug!(%destination, alert_id = condition.id.0, "Alert cleared mid-tick, skipping");
        return Fire::Gone;
    }

    let key = RetryKey::Alert(condition.id);
    if !state.retry.ready(key).await {
        debug!(%destination, alert_id = condition.id.0, "Alert waiting out retry backoff");
        return Fire::Deferred;
    }

    info!(
        %destination,
        alert_id  = condition.id.0,
        side      = %condition.side,
        threshold = %condition.threshold,
        %price,
        "🎯 Alert triggered"
    );

    let symbol = &state.config.symbol;
    let shown = cents(price);
    match execute_trade(state, condition.side, price, TradeReason::AlertTrigger).await {
        Ok(_) => {
            state.retry.record_success(key).await;
            state.broadcast(&EngineEvent::AlertTriggered {
                destination: destination.clone(),
                alert_id:    condition.id,
                price,
            });
            state
                .notify(destination, &format!("✅ Auto-{}: {symbol} at ${shown:.2}", condition.side))
                .await;
            Fire::Placed
        }
        Err(e) => {
            warn!(%destination, alert_id = condition.id.0, error = %e, "Alert order failed, keeping alert");
            state.retry.record_failure(key).await;
            state
                .notify(
                    destination,
                    &format!("❌ Auto-{} failed: {symbol} at ${shown:.2} ({e}). Will retry.", condition.side),
                )
                .await;
            Fire::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, RetryConfig};
    use crate::error::EngineError;
    use crate::models::Side;
    use crate::state::testing::{harness, harness_with, Harness};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn d1() -> Destination {
        Destination::new("D1")
    }

    async fn add(h: &Harness, dest: &Destination, price: Decimal, side: Side) {
        h.state.alerts.lock().await.add_alert(dest, price, side).unwrap();
    }

    #[tokio::test]
    async fn buy_alert_fires_exactly_once() {
        let h = harness(dec!(252.00));
        add(&h, &d1(), dec!(250.00), Side::Buy).await;

        let report = evaluate_alerts(&h.state).await.unwrap();
        assert_eq!(report.fired, 0);
        assert!(h.broker.submitted().await.is_empty());
        assert_eq!(h.state.alerts.lock().await.list_alerts(&d1()).len(), 1);

        h.feed.set_price(Some(dec!(249.50))).await;
        let report = evaluate_alerts(&h.state).await.unwrap();
        assert_eq!(report.fired, 1);

        let orders = h.broker.submitted().await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].side, Side::Buy);
        assert!(h.state.alerts.lock().await.list_alerts(&d1()).is_empty());

        let ledger = h.state.ledger.tail(1).await.unwrap();
        assert_eq!(ledger[0].reason, "Alert Trigger");
        assert_eq!(ledger[0].price, dec!(249.50));

        assert_eq!(
            h.notifier.messages_for(&d1()).await,
            vec!["✅ Auto-BUY: TSLA at $249.50".to_string()]
        );

        evaluate_alerts(&h.state).await.unwrap();
        assert_eq!(h.broker.submitted().await.len(), 1);
    }

    #[tokio::test]
    async fn sell_alert_fires_at_or_above_threshold() {
        let h = harness(dec!(259.99));
        add(&h, &d1(), dec!(260), Side::Sell).await;

        evaluate_alerts(&h.state).await.unwrap();
        assert!(h.broker.submitted().await.is_empty());

        h.feed.set_price(Some(dec!(260))).await;
        evaluate_alerts(&h.state).await.unwrap();
        let orders = h.broker.submitted().await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].side, Side::Sell);
        assert!(h.state.alerts.lock().await.list_alerts(&d1()).is_empty());
    }

    #[tokio::test]
    async fn rejected_order_keeps_alert_for_next_tick() {
        let h = harness(dec!(240));
        add(&h, &d1(), dec!(250), Side::Buy).await;
        h.broker.reject_orders(Some("insufficient buying power")).await;

        let report = evaluate_alerts(&h.state).await.unwrap();
        assert_eq!((report.fired, report.failed), (0, 1));
        assert_eq!(h.state.alerts.lock().await.list_alerts(&d1()).len(), 1);
        assert!(h.state.ledger.tail(1).await.unwrap().is_empty());

        let notices = h.notifier.messages_for(&d1()).await;
        assert_eq!(notices.len(), 1);
        assert!(notices[0].starts_with("❌ Auto-BUY failed"));

        h.broker.reject_orders(None).await;
        let report = evaluate_alerts(&h.state).await.unwrap();
        assert_eq!(report.fired, 1);
        assert!(h.state.alerts.lock().await.list_alerts(&d1()).is_empty());
    }

    #[tokio::test]
    async fn duplicates_and_destinations_fire_independently() {
        let h = harness(dec!(100));
        let d2 = Destination::new("D2");
        add(&h, &d1(), dec!(150), Side::Buy).await;
        add(&h, &d1(), dec!(150), Side::Buy).await;
        add(&h, &d1(), dec!(90), Side::Buy).await;
        add(&h, &d2, dec!(100), Side::Sell).await;

        let report = evaluate_alerts(&h.state).await.unwrap();
        assert_eq!(report.fired, 3);
        assert_eq!(h.broker.submitted().await.len(), 3);

        let remaining = h.state.alerts.lock().await.list_alerts(&d1()).to_vec();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].threshold, dec!(90));
        assert!(h.state.alerts.lock().await.list_alerts(&d2).is_empty());
    }

    #[tokio::test]
    async fn feed_outage_skips_tick_untouched() {
        let h = harness(dec!(100));
        add(&h, &d1(), dec!(150), Side::Buy).await;
        h.feed.set_price(None).await;

        let err = evaluate_alerts(&h.state).await.unwrap_err();
        assert!(matches!(err, EngineError::FeedUnavailable(_)));
        assert_eq!(h.state.alerts.lock().await.pending_count(), 1);
        assert!(h.broker.submitted().await.is_empty());
    }

    #[tokio::test]
    async fn cleared_alerts_never_fire() {
        let h = harness(dec!(100));
        add(&h, &d1(), dec!(150), Side::Buy).await;
        h.state.alerts.lock().await.clear_alerts(&d1());

        evaluate_alerts(&h.state).await.unwrap();
        assert!(h.broker.submitted().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_defers_retries_until_elapsed() {
        let config = Config {
            retry: RetryConfig { base: Duration::from_secs(120), max: Duration::from_secs(900) },
            ..Config::default()
        };
        let h = harness_with(config, dec!(240));
        add(&h, &d1(), dec!(250), Side::Buy).await;
        h.broker.reject_orders(Some("halted")).await;

        assert_eq!(evaluate_alerts(&h.state).await.unwrap().failed, 1);
        h.broker.reject_orders(None).await;

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(evaluate_alerts(&h.state).await.unwrap().deferred, 1);
        assert!(h.broker.submitted().await.is_empty());

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(evaluate_alerts(&h.state).await.unwrap().fired, 1);
        assert_eq!(h.state.retry.pending().await, 0);
    }

    #[tokio::test]
    async fn one_rejection_does_not_stop_the_tick() {
        let h = harness(dec!(240));
        let d2 = Destination::new("D2");
        let kept = h.state.alerts.lock().await.add_alert(&d1(), dec!(250), Side::Buy).unwrap();
        add(&h, &d1(), dec!(245), Side::Buy).await;
        add(&h, &d2, dec!(250), Side::Buy).await;
        h.broker.script_orders([Some("halted"), None, None]).await;

        let report = evaluate_alerts(&h.state).await.unwrap();
        assert_eq!((report.fired, report.failed), (2, 1));

        assert_eq!(h.state.alerts.lock().await.list_alerts(&d1()).to_vec(), vec![kept]);
        assert!(h.state.alerts.lock().await.list_alerts(&d2).is_empty());
        assert_eq!(h.broker.submitted().await.len(), 2);
        assert_eq!(h.state.ledger.entry_count().await.unwrap(), 2);

        let notices = h.notifier.messages_for(&d1()).await;
        assert!(notices[0].starts_with("❌ Auto-BUY failed"));
        assert_eq!(notices[1], "✅ Auto-BUY: TSLA at $240.00");
        assert_eq!(h.notifier.messages_for(&d2).await, vec!["✅ Auto-BUY: TSLA at $240.00".to_string()]);
    }

    #[tokio::test]
    async fn notifier_outage_still_retires_and_ledgers() {
        let h = harness(dec!(240));
        add(&h, &d1(), dec!(250), Side::Buy).await;
        h.notifier.fail_deliveries(true);

        assert_eq!(evaluate_alerts(&h.state).await.unwrap().fired, 1);
        assert!(h.state.alerts.lock().await.list_alerts(&d1()).is_empty());
        assert_eq!(h.state.ledger.entry_count().await.unwrap(), 1);
        assert!(h.notifier.messages_for(&d1()).await.is_empty());

        evaluate_alerts(&h.state).await.unwrap();
        assert_eq!(h.broker.submitted().await.len(), 1);
    }

    #[tokio::test]
    async fn notice_and_ledger_agree_on_rounded_price() {
        let h = harness(dec!(249.559));
        add(&h, &d1(), dec!(250), Side::Buy).await;

        evaluate_alerts(&h.state).await.unwrap();
        let line = h.state.ledger.tail(1).await.unwrap()[0].to_line();
        assert!(line.ends_with("| BUY | TSLA | Price: 249.56 | Reason: Alert Trigger"));
        assert_eq!(
            h.notifier.messages_for(&d1()).await,
            vec!["✅ Auto-BUY: TSLA at $249.56".to_string()]
        );
    }
}
