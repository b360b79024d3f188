//! Simple Moving Average (SMA) crossover indicator.

use crate::services::signals::{make_reading, Indicator};
use crate::types::{Candle, IndicatorCategory, IndicatorReading, Vote};

/// Mean close of the `period` candles ending at `end` (exclusive).
pub fn sma_at(candles: &[Candle], end: usize, period: usize) -> Option<f64> {
    if period == 0 || end < period || end > candles.len() {
        return None;
    }
    let sum: f64 = candles[end - period..end].iter().map(|c| c.close).sum();
    Some(sum / period as f64)
}

/// Price/SMA crossover.
///
/// - Close crosses above the SMA on the latest candle: bullish
/// - Close crosses below the SMA: bearish
pub struct SmaCross {
    period: usize,
    name: String,
}

impl Default for SmaCross {
    fn default() -> Self {
        Self::new(50)
    }
}

impl SmaCross {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            name: format!("SMA{}", period),
        }
    }
}

impl Indicator for SmaCross {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Trend
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading> {
        if candles.len() < self.min_periods() {
            return None;
        }

        let n = candles.len();
        let sma = sma_at(candles, n, self.period)?;
        let prev_sma = sma_at(candles, n - 1, self.period)?;
        let close = candles[n - 1].close;
        let prev_close = candles[n - 2].close;

        let vote = if prev_close <= prev_sma && close > sma {
            Vote::Bullish
        } else if prev_close >= prev_sma && close < sma {
            Vote::Bearish
        } else {
            Vote::Neutral
        };

        Some(make_reading(
            self.name(),
            self.category(),
            &[(self.name(), sma)],
            vote,
        ))
    }
}
