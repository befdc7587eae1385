//! # models::trade
//!
//! [`TradeLedgerEntry`] — one executed action in the audit ledger, and its
//! single-line text encoding:
//!
//! ```text
//! 2026-10-16 14:03:11 | BUY | TSLA | Price: 249.50 | Reason: Alert Trigger
//! ```

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::Side;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FIELD_SEPARATOR: &str = " | ";

/// Round a price to whole cents, half away from zero.  Every price shown to a
/// person or written to the ledger goes through this before `{:.2}`, which
/// on its own truncates.
pub fn cents(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ─── TradeReason ──────────────────────────────────────────────────────────────

/// Which path produced a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeReason {
    AlertTrigger,
    StrategySignal,
    ManualTrade,
}

impl TradeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeReason::AlertTrigger   => "Alert Trigger",
            TradeReason::StrategySignal => "Strategy Signal",
            TradeReason::ManualTrade    => "Manual Trade",
        }
    }
}

impl fmt::Display for TradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── TradeLedgerEntry ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeLedgerEntry {
    pub timestamp:  DateTime<Utc>,
    pub action:     Side,
    pub instrument: String,
    pub price:      Decimal,
    pub reason:     String,
}

impl TradeLedgerEntry {
    pub fn new(action: Side, instrument: &str, price: Decimal, reason: TradeReason) -> Self {
        Self {
            timestamp:  Utc::now(),
            action,
            instrument: instrument.to_string(),
            price,
            reason:     reason.to_string(),
        }
    }

    /// Encode as one ledger line (no trailing newline).
    pub fn to_line(&self) -> String {
        let price = cents(self.price);

        format!(
            "{ts}{sep}{action}{sep}{instrument}{sep}Price: {price:.2}{sep}Reason: {reason}",
            ts         = self.timestamp.format(TIMESTAMP_FORMAT),
            sep        = FIELD_SEPARATOR,
            action     = self.action,
            instrument = self.instrument,
            reason     = self.reason,
        )
    }

    /// Decode a ledger line.  Returns `None` for anything that is not a
    /// well-formed entry.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.trim_end_matches(['\r', '\n']).splitn(5, FIELD_SEPARATOR);

        let timestamp = NaiveDateTime::parse_from_str(fields.next()?, TIMESTAMP_FORMAT)
            .ok()?
            .and_utc();
        let action     = fields.next()?.parse::<Side>().ok()?;
        let instrument = fields.next()?.to_string();
        let price      = fields.next()?.strip_prefix("Price: ")?.parse::<Decimal>().ok()?;
        let reason     = fields.next()?.strip_prefix("Reason: ")?.to_string();

        Some(Self { timestamp, action, instrument, price, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn entry(price: Decimal) -> TradeLedgerEntry {
        TradeLedgerEntry {
            timestamp:  Utc.with_ymd_and_hms(2026, 10, 16, 14, 3, 11).unwrap(),
            action:     Side::Buy,
            instrument: "TSLA".to_string(),
            price,
            reason:     TradeReason::AlertTrigger.to_string(),
        }
    }

    #[test]
    fn line_format_matches_ledger_layout() {
        assert_eq!(
            entry(dec!(249.5)).to_line(),
            "2026-10-16 14:03:11 | BUY | TSLA | Price: 249.50 | Reason: Alert Trigger"
        );
    }

    #[test]
    fn price_is_rounded_to_cents() {
        assert!(entry(dec!(249.555)).to_line().contains("Price: 249.56 |"));
        assert!(entry(dec!(250)).to_line().contains("Price: 250.00 |"));
    }

    #[test]
    fn cents_rounds_rather_than_truncates() {
        assert_eq!(format!("{:.2}", cents(dec!(249.559))), "249.56");
        assert_eq!(format!("{:.2}", cents(dec!(249.554))), "249.55");
        assert_eq!(format!("{:.2}", cents(dec!(-0.005))), "-0.01");
        assert_eq!(format!("{:.2}", cents(dec!(7))), "7.00");
    }

    #[test]
    fn parses_its_own_line() {
        let original = entry(dec!(249.50));
        let parsed = TradeLedgerEntry::parse_line(&original.to_line()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn reason_may_contain_separator() {
        let mut e = entry(dec!(10));
        e.reason = "custom | note".to_string();
        let parsed = TradeLedgerEntry::parse_line(&e.to_line()).unwrap();
        assert_eq!(parsed.reason, "custom | note");
    }

    #[test]
    fn rejects_garbage() {
        assert!(TradeLedgerEntry::parse_line("").is_none());
        assert!(TradeLedgerEntry::parse_line("not a ledger line").is_none());
        assert!(TradeLedgerEntry::parse_line(
            "2026-10-16 14:03:11 | HOLD | TSLA | Price: 1.00 | Reason: x"
        )
        .is_none());
    }
}
