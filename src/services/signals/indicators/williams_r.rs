//! Williams %R indicator.

use super::stochastic::high_low;
use crate::services::signals::{make_reading, Indicator};
use crate::types::{Candle, IndicatorCategory, IndicatorReading, Vote};

/// Williams %R.
///
/// %R = (Highest High - Close) / (Highest High - Lowest Low) * -100, in [-100, 0].
/// Below -80 is oversold (bullish), above -20 overbought (bearish).
pub struct WilliamsR {
    period: usize,
    overbought: f64,
    oversold: f64,
    name: String,
}

impl Default for WilliamsR {
    fn default() -> Self {
        Self::new(14, -20.0, -80.0)
    }
}

impl WilliamsR {
    pub fn new(period: usize, overbought: f64, oversold: f64) -> Self {
        Self {
            period,
            overbought,
            oversold,
            name: format!("WILLR{}", period),
        }
    }
}

impl Indicator for WilliamsR {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Momentum
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading> {
        if self.period == 0 || candles.len() < self.period {
            return None;
        }

        let window = &candles[candles.len() - self.period..];
        let (highest_high, lowest_low) = high_low(window);
        let close = candles.last()?.close;

        let value = if highest_high != lowest_low {
            (highest_high - close) / (highest_high - lowest_low) * -100.0
        } else {
            -50.0
        };

        let vote = if value < self.oversold {
            Vote::Bullish
        } else if value > self.overbought {
            Vote::Bearish
        } else {
            Vote::Neutral
        };

        Some(make_reading(
            self.name(),
            self.category(),
            &[(self.name(), value)],
            vote,
        ))
    }
}
