//! # engine::indicators
//!
//! Simple moving averages over daily closes and the crossover signal built
//! from a short and a long one.  Exact decimal arithmetic, so two averages
//! over identical data compare equal.

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::Signal;

/// Mean of the last `window` values, `None` when there are fewer.
pub fn sma(closes: &[Decimal], window: usize) -> Option<Decimal> {
    if window == 0 || closes.len() < window {
        return None;
    }
    let sum: Decimal = closes[closes.len() - window..].iter().sum();
    Some(sum / Decimal::from(window))
}

/// Short/long moving averages at the most recent close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crossover {
    pub short_ma:   Decimal,
    pub long_ma:    Decimal,
    pub last_close: Decimal,
}

impl Crossover {
    /// `InsufficientHistory` when `closes` cannot fill the long window.
    pub fn compute(closes: &[Decimal], short_window: usize, long_window: usize) -> EngineResult<Self> {
        let insufficient = || EngineError::InsufficientHistory {
            have: closes.len(),
            need: long_window,
        };

        let long_ma = sma(closes, long_window).ok_or_else(insufficient)?;
        let short_ma = sma(closes, short_window).ok_or_else(insufficient)?;
        let last_close = *closes.last().ok_or_else(insufficient)?;

        Ok(Self { short_ma, long_ma, last_close })
    }

    /// BUY above, SELL below, NONE when the averages coincide.
    pub fn signal(&self) -> Signal {
        use std::cmp::Ordering::*;
        match self.short_ma.cmp(&self.long_ma) {
            Greater => Signal::Buy,
            Less    => Signal::Sell,
            Equal   => Signal::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn series(values: &[i64]) -> Vec<Decimal> {
        values.iter().copied().map(Decimal::from).collect()
    }

    #[test]
    fn sma_uses_trailing_window() {
        let closes = series(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(sma(&closes, 3), Some(dec!(5)));
        assert_eq!(sma(&closes, 6), Some(dec!(3.5)));
        assert_eq!(sma(&closes, 7), None);
        assert_eq!(sma(&closes, 0), None);
    }

    #[test]
    fn nineteen_closes_are_not_enough() {
        let closes = vec![dec!(100); 19];
        let err = Crossover::compute(&closes, 5, 20).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientHistory { have: 19, need: 20 }));
    }

    #[test]
    fn rising_tail_signals_buy() {
        let mut closes = vec![dec!(100); 19];
        closes.push(dec!(120));
        let crossover = Crossover::compute(&closes, 5, 20).unwrap();
        assert_eq!(crossover.short_ma, dec!(104));
        assert_eq!(crossover.long_ma, dec!(101));
        assert_eq!(crossover.last_close, dec!(120));
        assert_eq!(crossover.signal(), Signal::Buy);
    }

    #[test]
    fn falling_tail_signals_sell() {
        let mut closes = vec![dec!(100); 19];
        closes.push(dec!(80));
        assert_eq!(Crossover::compute(&closes, 5, 20).unwrap().signal(), Signal::Sell);
    }

    #[test]
    fn flat_market_is_neutral() {
        let closes = vec![dec!(250.25); 30];
        assert_eq!(Crossover::compute(&closes, 5, 20).unwrap().signal(), Signal::None);
    }
}
