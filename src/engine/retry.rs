//! # engine::retry
//!
//! Spacing of retries after a rejected order.
//!
//! A condition (or the strategy) whose order is rejected stays armed and is
//! retried on a later tick.  With a zero base delay that later tick is simply
//! the next one.  With a positive base the wait doubles per consecutive
//! failure, capped at the configured maximum, and resets on success.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::warn;

use crate::config::RetryConfig;
use crate::models::AlertId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryKey {
    Alert(AlertId),
    Strategy,
}

#[derive(Debug)]
struct Backoff {
    failures:     u32,
    next_attempt: Instant,
}

pub struct RetryGate {
    config: RetryConfig,
    inner:  Mutex<HashMap<RetryKey, Backoff>>,
}

impl RetryGate {
    pub fn new(config: RetryConfig) -> Self {
        Self { config, inner: Mutex::new(HashMap::new()) }
    }

    /// May `key` submit an order now?
    pub async fn ready(&self, key: RetryKey) -> bool {
        if self.config.base.is_zero() {
            return true;
        }
        let inner = self.inner.lock().await;
        inner
            .get(&key)
            .map(|b| Instant::now() >= b.next_attempt)
            .unwrap_or(true)
    }

    /// Record a rejected order; returns the wait before the next attempt.
    pub async fn record_failure(&self, key: RetryKey) -> Duration {
        let mut inner = self.inner.lock().await;
        let entry = inner.entry(key).or_insert(Backoff {
            failures:     0,
            next_attempt: Instant::now(),
        });
        entry.failures += 1;

        let delay = self.delay_for(entry.failures);
        entry.next_attempt = Instant::now() + delay;

        warn!(
            ?key,
            consecutive = entry.failures,
            retry_in    = ?delay,
            "⚠️ Order failure recorded"
        );
        delay
    }

    pub async fn record_success(&self, key: RetryKey) {
        self.inner.lock().await.remove(&key);
    }

    /// Forget alert keys for which `keep` is false (conditions no longer registered).
    pub async fn prune_alerts(&self, keep: impl Fn(AlertId) -> bool) {
        self.inner.lock().await.retain(|key, _| match key {
            RetryKey::Alert(id) => keep(*id),
            RetryKey::Strategy  => true,
        });
    }

    /// Forget every recorded failure.
    pub async fn clear(&self) {
        self.inner.lock().await.clear();
    }

    /// Keys currently carrying at least one unresolved failure.
    pub async fn pending(&self) -> usize {
        self.inner.lock().await.len()
    }

    fn delay_for(&self, failures: u32) -> Duration {
        if self.config.base.is_zero() {
            return Duration::ZERO;
        }
        let exponent = failures.saturating_sub(1).min(16);
        self.config
            .base
            .saturating_mul(1u32 << exponent)
            .min(self.config.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(base: u64, max: u64) -> RetryGate {
        RetryGate::new(RetryConfig {
            base: Duration::from_secs(base),
            max:  Duration::from_secs(max),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn zero_base_retries_every_tick() {
        let gate = gate(0, 900);
        assert_eq!(gate.record_failure(RetryKey::Strategy).await, Duration::ZERO);
        assert!(gate.ready(RetryKey::Strategy).await);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_up_to_max() {
        let gate = gate(60, 200);
        let key = RetryKey::Alert(AlertId(7));

        assert_eq!(gate.record_failure(key).await, Duration::from_secs(60));
        assert!(!gate.ready(key).await);
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(gate.ready(key).await);

        assert_eq!(gate.record_failure(key).await, Duration::from_secs(120));
        assert_eq!(gate.record_failure(key).await, Duration::from_secs(200));

        gate.record_success(key).await;
        assert!(gate.ready(key).await);
        assert_eq!(gate.pending().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn prune_drops_retired_alerts_only() {
        let gate = gate(60, 600);
        gate.record_failure(RetryKey::Alert(AlertId(1))).await;
        gate.record_failure(RetryKey::Alert(AlertId(2))).await;
        gate.record_failure(RetryKey::Strategy).await;

        gate.prune_alerts(|id| id == AlertId(2)).await;
        assert_eq!(gate.pending().await, 2);
        assert!(!gate.ready(RetryKey::Alert(AlertId(2))).await);
        assert!(gate.ready(RetryKey::Alert(AlertId(1))).await);
    }
}
