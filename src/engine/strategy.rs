//! # engine::strategy
//!
//! **Strategy Evaluator** — the 5/20-day moving-average crossover.
//!
//! Edge-triggered: an order goes out only when the crossover side differs
//! from the last signal that was actually traded.  `last_signal` moves only
//! after the brokerage accepted the order, so a rejected order is simply
//! tried again on the next tick.

use std::sync::atomic::Ordering;

use tracing::{debug, info, warn};

use crate::engine::executor::execute_trade;
use crate::engine::indicators::Crossover;
use crate::engine::retry::RetryKey;
use crate::error::{EngineError, EngineResult};
use crate::events::EngineEvent;
use crate::models::{cents, Side, Signal, TradeReason};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    Disabled,
    /// Not enough closes for the long window; nothing evaluated.
    InsufficientHistory { have: usize, need: usize },
    /// Averages coincide.
    Neutral,
    /// Crossover side already traded.
    Holding(Signal),
    /// Waiting out a retry backoff after a rejected order.
    Deferred(Signal),
    Traded(Signal),
    Failed(Signal),
}

pub async fn evaluate_strategy(state: &AppState) -> EngineResult<StrategyOutcome> {
    let generation = {
        let strategy = state.strategy.lock().await;
        if !strategy.enabled {
            return Ok(StrategyOutcome::Disabled);
        }
        strategy.generation
    };
    state.strategy_ticks.fetch_add(1, Ordering::Relaxed);

    let params = &state.config.strategy;
    let symbol = &state.config.symbol;

    let closes = state.feed.daily_closes(symbol, params.lookback_days).await?;
    let crossover = match Crossover::compute(&closes, params.short_window, params.long_window) {
        Ok(crossover) => crossover,
        Err(EngineError::InsufficientHistory { have, need }) => {
            debug!(have, need, "Not enough daily closes yet, skipping strategy tick");
            return Ok(StrategyOutcome::InsufficientHistory { have, need });
        }
        Err(e) => return Err(e),
    };

    let target = crossover.signal();
    debug!(
        short_ma = %crossover.short_ma,
        long_ma  = %crossover.long_ma,
        close    = %crossover.last_close,
        ?target,
        "📐 Moving averages computed"
    );

    let Some(side) = target.side() else {
        return Ok(StrategyOutcome::Neutral);
    };

    if state.strategy.lock().await.last_signal == target {
        return Ok(StrategyOutcome::Holding(target));
    }

    if !state.retry.ready(RetryKey::Strategy).await {
        debug!(?target, "Strategy order waiting out retry backoff");
        return Ok(StrategyOutcome::Deferred(target));
    }

    info!(
        ?target,
        short_ma = %crossover.short_ma,
        long_ma  = %crossover.long_ma,
        price    = %crossover.last_close,
        "⚡ Crossover edge, trading"
    );
    state.broadcast(&EngineEvent::StrategySignal {
        signal:   target,
        short_ma: crossover.short_ma,
        long_ma:  crossover.long_ma,
        price:    crossover.last_close,
    });

    let price = crossover.last_close;
    let shown = cents(price);
    let destination = state.strategy_destination().await;

    match execute_trade(state, side, price, TradeReason::StrategySignal).await {
        Ok(_) => {
            {
                let mut strategy = state.strategy.lock().await;
                if strategy.generation == generation {
                    strategy.last_signal = target;
                } else {
                    warn!(?target, "Strategy reset while trading, signal not recorded");
                }
            }
            state.retry.record_success(RetryKey::Strategy).await;

            let icon = match side {
                Side::Buy  => "📈",
                Side::Sell => "📉",
            };
            if let Some(destination) = &destination {
                state
                    .notify(destination, &format!("{icon} Strategy {side} signal at ${shown:.2}"))
                    .await;
            }
            Ok(StrategyOutcome::Traded(target))
        }
        Err(e) => {
            warn!(?target, error = %e, "Strategy order failed, signal unchanged");
            state.retry.record_failure(RetryKey::Strategy).await;
            if let Some(destination) = &destination {
                state
                    .notify(destination, &format!("❌ Strategy {side} order failed at ${shown:.2} ({e}). Will retry."))
                    .await;
            }
            Ok(StrategyOutcome::Failed(target))
        }
    }
}
