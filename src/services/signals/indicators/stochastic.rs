//! Stochastic Oscillator indicator.

use crate::services::signals::{make_reading, Indicator};
use crate::types::{Candle, IndicatorCategory, IndicatorReading, Vote};

/// Highest high and lowest low of a window.
pub(crate) fn high_low(window: &[Candle]) -> (f64, f64) {
    let lowest_low = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let highest_high = window
        .iter()
        .map(|c| c.high)
        .fold(f64::NEG_INFINITY, f64::max);
    (highest_high, lowest_low)
}

/// Stochastic Oscillator.
///
/// Compares closing price to price range over a period:
/// %K = (Current Close - Lowest Low) / (Highest High - Lowest Low) * 100
/// %D = SMA of %K
///
/// Signals:
/// - %K below oversold (20): bullish
/// - %K above overbought (80): bearish
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
    overbought: f64,
    oversold: f64,
    name: String,
}

impl Default for Stochastic {
    fn default() -> Self {
        Self::new(14, 3, 80.0, 20.0)
    }
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize, overbought: f64, oversold: f64) -> Self {
        Self {
            k_period,
            d_period,
            overbought,
            oversold,
            name: format!("STOCH{}", k_period),
        }
    }
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Momentum
    }

    fn min_periods(&self) -> usize {
        (self.k_period + self.d_period).saturating_sub(1)
    }

    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading> {
        if self.k_period == 0 || self.d_period == 0 || candles.len() < self.min_periods() {
            return None;
        }

        // Only the %K values that feed %D are needed
        let first = candles.len() - self.d_period;
        let k_values: Vec<f64> = (first..candles.len())
            .map(|i| {
                let window = &candles[(i + 1 - self.k_period)..=i];
                let (highest_high, lowest_low) = high_low(window);
                if highest_high != lowest_low {
                    ((candles[i].close - lowest_low) / (highest_high - lowest_low)) * 100.0
                } else {
                    50.0
                }
            })
            .collect();

        let k = *k_values.last()?;
        let d = k_values.iter().sum::<f64>() / self.d_period as f64;

        let vote = if k < self.oversold {
            Vote::Bullish
        } else if k > self.overbought {
            Vote::Bearish
        } else {
            Vote::Neutral
        };

        Some(make_reading(
            self.name(),
            self.category(),
            &[("%K", k), ("%D", d)],
            vote,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_support::{downtrend, flat, uptrend};

    #[test]
    fn test_stochastic_name() {
        let stoch = Stochastic::default();
        assert_eq!(stoch.name(), "STOCH14");
        assert_eq!(stoch.category(), IndicatorCategory::Momentum);
    }

    #[test]
    fn test_stochastic_min_periods() {
        assert_eq!(Stochastic::default().min_periods(), 16);
        assert!(Stochastic::default().calculate(&uptrend(15)).is_none());
        assert!(Stochastic::default().calculate(&uptrend(16)).is_some());
    }

    #[test]
    fn test_stochastic_uptrend_is_overbought() {
        let output = Stochastic::default().calculate(&uptrend(30)).unwrap();
        assert!(output.values["%K"] > 80.0);
        assert!((0.0..=100.0).contains(&output.values["%D"]));
        assert_eq!(output.vote, Vote::Bearish);
    }

    #[test]
    fn test_stochastic_downtrend_is_oversold() {
        let output = Stochastic::default().calculate(&downtrend(30)).unwrap();
        assert!(output.values["%K"] < 20.0);
        assert_eq!(output.vote, Vote::Bullish);
    }

    #[test]
    fn test_stochastic_zero_range_reads_50() {
        let output = Stochastic::default().calculate(&flat(30, 100.0)).unwrap();
        assert_eq!(output.values["%K"], 50.0);
        assert_eq!(output.values["%D"], 50.0);
        assert_eq!(output.vote, Vote::Neutral);
    }
}
