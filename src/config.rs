//! # config — engine settings from environment variables
//!
//! Every tunable of the engine, read once at startup after `.env` has been
//! loaded.  Missing optional values fall back to defaults; malformed numbers
//! and unknown adapter names abort startup.

use std::{net::SocketAddr, time::Duration};

use anyhow::{bail, Context};
use rust_decimal::Decimal;

use crate::models::Destination;

// ─── Adapter selection ────────────────────────────────────────────────────────

/// Which brokerage / market-data backend to talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerMode {
    /// Alpaca REST API (orders + market data).
    Alpaca,
    /// In-memory paper broker and a fixed-price feed.
    Mock,
}

/// Where notifications are delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierMode {
    Telegram,
    /// Only write notices to the log.
    Log,
}

#[derive(Debug, Clone)]
pub struct AlpacaConfig {
    pub api_key:    String,
    pub secret_key: String,
    /// Trading API, e.g. `https://paper-api.alpaca.markets`.
    pub base_url:   String,
    /// Market data API, e.g. `https://data.alpaca.markets`.
    pub data_url:   String,
}

// ─── Scheduler cadence ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub alert_interval:    Duration,
    pub alert_first:       Duration,
    pub strategy_interval: Duration,
    pub strategy_first:    Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            alert_interval:    Duration::from_secs(60),
            alert_first:       Duration::from_secs(10),
            strategy_interval: Duration::from_secs(300),
            strategy_first:    Duration::from_secs(20),
        }
    }
}

// ─── Strategy parameters ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyConfig {
    pub short_window:  usize,
    pub long_window:   usize,
    /// Daily closes requested per tick; must cover `long_window`.
    pub lookback_days: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self { short_window: 5, long_window: 20, lookback_days: 30 }
    }
}

// ─── Retry backoff ────────────────────────────────────────────────────────────

/// Spacing of retries after a rejected order.  `base == 0` retries on every
/// tick.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RetryConfig {
    pub base: Duration,
    pub max:  Duration,
}

// ─── Config ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr:            SocketAddr,
    /// The single tracked instrument, e.g. `"TSLA"`.
    pub symbol:               String,
    pub ledger_path:          String,
    /// Caller identity allowed to run privileged commands.
    pub admin_id:             Option<String>,
    /// Shared secret for the HTTP surface; `None` = open (dev mode).
    pub api_key:              Option<String>,
    pub order_qty:            Decimal,
    pub request_timeout:      Duration,
    pub schedule:             ScheduleConfig,
    pub strategy:             StrategyConfig,
    pub strategy_destination: Option<Destination>,
    pub retry:                RetryConfig,
    pub broker:               BrokerMode,
    pub alpaca:               Option<AlpacaConfig>,
    pub notifier:             NotifierMode,
    pub telegram_token:       Option<String>,
    pub mock_price:           Decimal,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr:            SocketAddr::from(([0, 0, 0, 0], 3000)),
            symbol:               "TSLA".to_string(),
            ledger_path:          "trades.log".to_string(),
            admin_id:             None,
            api_key:              None,
            order_qty:            Decimal::ONE,
            request_timeout:      Duration::from_secs(10),
            schedule:             ScheduleConfig::default(),
            strategy:             StrategyConfig::default(),
            strategy_destination: None,
            retry:                RetryConfig { base: Duration::ZERO, max: Duration::from_secs(900) },
            broker:               BrokerMode::Mock,
            alpaca:               None,
            notifier:             NotifierMode::Log,
            telegram_token:       None,
            mock_price:           Decimal::new(25_000, 2),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr: SocketAddr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .context("BIND_ADDR must be a socket address, e.g. 0.0.0.0:3000")?;

        let broker = match env_string("BROKER").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("mock") => BrokerMode::Mock,
            Some("alpaca")      => BrokerMode::Alpaca,
            Some(other) => bail!("Unknown BROKER: '{other}'. Use 'alpaca' or 'mock'"),
        };

        let alpaca = match broker {
            BrokerMode::Alpaca => Some(AlpacaConfig {
                api_key: std::env::var("ALPACA_API_KEY")
                    .context("ALPACA_API_KEY is required when BROKER=alpaca")?,
                secret_key: std::env::var("ALPACA_SECRET_KEY")
                    .context("ALPACA_SECRET_KEY is required when BROKER=alpaca")?,
                base_url: env_string("ALPACA_BASE_URL")
                    .unwrap_or_else(|| "https://paper-api.alpaca.markets".to_string()),
                data_url: env_string("ALPACA_DATA_URL")
                    .unwrap_or_else(|| "https://data.alpaca.markets".to_string()),
            }),
            BrokerMode::Mock => None,
        };

        let notifier = match env_string("NOTIFIER").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("log") => NotifierMode::Log,
            Some("telegram")   => NotifierMode::Telegram,
            Some(other) => bail!("Unknown NOTIFIER: '{other}'. Use 'telegram' or 'log'"),
        };

        let telegram_token = env_string("TELEGRAM_BOT_TOKEN");
        if notifier == NotifierMode::Telegram && telegram_token.is_none() {
            bail!("TELEGRAM_BOT_TOKEN is required when NOTIFIER=telegram");
        }

        let schedule = ScheduleConfig {
            alert_interval:    env_secs("ALERT_CHECK_SECS", defaults.schedule.alert_interval)?,
            alert_first:       env_secs("ALERT_FIRST_SECS", defaults.schedule.alert_first)?,
            strategy_interval: env_secs("STRATEGY_CHECK_SECS", defaults.schedule.strategy_interval)?,
            strategy_first:    env_secs("STRATEGY_FIRST_SECS", defaults.schedule.strategy_first)?,
        };
        if schedule.alert_interval.is_zero() || schedule.strategy_interval.is_zero() {
            bail!("ALERT_CHECK_SECS and STRATEGY_CHECK_SECS must be greater than zero");
        }

        let strategy = StrategyConfig {
            short_window:  env_parse("STRATEGY_SHORT_WINDOW", defaults.strategy.short_window)?,
            long_window:   env_parse("STRATEGY_LONG_WINDOW", defaults.strategy.long_window)?,
            lookback_days: env_parse("STRATEGY_LOOKBACK_DAYS", defaults.strategy.lookback_days)?,
        };
        if strategy.short_window == 0 || strategy.short_window >= strategy.long_window {
            bail!("STRATEGY_SHORT_WINDOW must be positive and smaller than STRATEGY_LONG_WINDOW");
        }
        if strategy.lookback_days < strategy.long_window {
            bail!("STRATEGY_LOOKBACK_DAYS must be at least STRATEGY_LONG_WINDOW");
        }

        let order_qty: Decimal = env_parse("ORDER_QTY", defaults.order_qty)?;
        if order_qty <= Decimal::ZERO {
            bail!("ORDER_QTY must be positive");
        }

        Ok(Self {
            bind_addr,
            symbol:               env_string("SYMBOL").unwrap_or(defaults.symbol),
            ledger_path:          env_string("LEDGER_PATH").unwrap_or(defaults.ledger_path),
            admin_id:             env_string("ADMIN_ID"),
            api_key:              env_string("API_KEY"),
            order_qty,
            request_timeout:      env_secs("REQUEST_TIMEOUT_SECS", defaults.request_timeout)?,
            schedule,
            strategy,
            strategy_destination: env_string("STRATEGY_DESTINATION").map(Destination::new),
            retry: RetryConfig {
                base: env_secs("RETRY_BACKOFF_BASE_SECS", defaults.retry.base)?,
                max:  env_secs("RETRY_BACKOFF_MAX_SECS", defaults.retry.max)?,
            },
            broker,
            alpaca,
            notifier,
            telegram_token,
            mock_price:           env_parse("MOCK_PRICE", defaults.mock_price)?,
        })
    }
}

/// Non-empty value of `key`, if set.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} must be a valid number, got '{raw}': {e}")),
        None => Ok(default),
    }
}

fn env_secs(key: &str, default: Duration) -> anyhow::Result<Duration> {
    env_parse(key, default.as_secs()).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_cadence() {
        let config = Config::default();
        assert_eq!(config.schedule.alert_interval, Duration::from_secs(60));
        assert_eq!(config.schedule.alert_first, Duration::from_secs(10));
        assert_eq!(config.schedule.strategy_interval, Duration::from_secs(300));
        assert_eq!(config.schedule.strategy_first, Duration::from_secs(20));
        assert_eq!(config.strategy, StrategyConfig { short_window: 5, long_window: 20, lookback_days: 30 });
        assert_eq!(config.symbol, "TSLA");
        assert_eq!(config.retry.base, Duration::ZERO);
        assert_eq!(config.broker, BrokerMode::Mock);
    }

    #[test]
    fn env_parse_reports_the_offending_key() {
        std::env::set_var("AUTOTRADER_TEST_BAD_NUMBER", "twelve");
        let err = env_parse::<u64>("AUTOTRADER_TEST_BAD_NUMBER", 1).unwrap_err();
        assert!(err.to_string().contains("AUTOTRADER_TEST_BAD_NUMBER"));
        std::env::remove_var("AUTOTRADER_TEST_BAD_NUMBER");
    }

    #[test]
    fn env_parse_falls_back_when_unset_or_blank() {
        assert_eq!(env_parse::<u64>("AUTOTRADER_TEST_UNSET", 7).unwrap(), 7);
        std::env::set_var("AUTOTRADER_TEST_BLANK", "  ");
        assert_eq!(env_parse::<u64>("AUTOTRADER_TEST_BLANK", 9).unwrap(), 9);
        std::env::remove_var("AUTOTRADER_TEST_BLANK");
    }
}
