//! Relative Strength Index (RSI) indicator.

use crate::services::signals::{make_reading, Indicator};
use crate::types::{Candle, IndicatorCategory, IndicatorReading, Vote};

/// RSI (Relative Strength Index) indicator.
///
/// Measures momentum by comparing the magnitude of recent gains to recent losses,
/// using Wilder's smoothing. Values range from 0-100:
/// - Below the oversold level: bullish vote
/// - Above the overbought level: bearish vote
pub struct Rsi {
    period: usize,
    overbought: f64,
    oversold: f64,
    name: String,
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(14, 70.0, 30.0)
    }
}

impl Rsi {
    pub fn new(period: usize, overbought: f64, oversold: f64) -> Self {
        Self {
            period,
            overbought,
            oversold,
            name: format!("RSI{}", period),
        }
    }

    /// Calculate RSI value from price changes.
    pub fn calculate_rsi(candles: &[Candle], period: usize) -> Option<f64> {
        if period == 0 || candles.len() < period + 1 {
            return None;
        }

        let mut gains = Vec::with_capacity(candles.len() - 1);
        let mut losses = Vec::with_capacity(candles.len() - 1);

        for pair in candles.windows(2) {
            let change = pair[1].close - pair[0].close;
            if change > 0.0 {
                gains.push(change);
                losses.push(0.0);
            } else {
                gains.push(0.0);
                losses.push(-change);
            }
        }

        // Seed with simple averages, then Wilder smoothing
        let mut avg_gain: f64 = gains.iter().take(period).sum::<f64>() / period as f64;
        let mut avg_loss: f64 = losses.iter().take(period).sum::<f64>() / period as f64;

        for i in period..gains.len() {
            avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        }

        if avg_loss == 0.0 {
            // No movement at all reads as balanced
            return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
        }

        let rs = avg_gain / avg_loss;
        Some(100.0 - (100.0 / (1.0 + rs)))
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Momentum
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading> {
        let rsi = Self::calculate_rsi(candles, self.period)?;

        let vote = if rsi > self.overbought {
            Vote::Bearish
        } else if rsi < self.oversold {
            Vote::Bullish
        } else {
            Vote::Neutral
        };

        Some(make_reading(
            self.name(),
            self.category(),
            &[(self.name(), rsi)],
            vote,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_support::{downtrend, flat, uptrend};

    #[test]
    fn test_rsi_name() {
        let rsi = Rsi::default();
        assert_eq!(rsi.name(), "RSI14");
    }

    #[test]
    fn test_rsi_min_periods() {
        let rsi = Rsi::default();
        assert_eq!(rsi.min_periods(), 15);
        assert_eq!(Rsi::new(7, 70.0, 30.0).min_periods(), 8);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let rsi = Rsi::default();
        assert!(rsi.calculate(&uptrend(10)).is_none());
    }

    #[test]
    fn test_rsi_monotonic_rise_reaches_100() {
        let output = Rsi::default().calculate(&uptrend(60)).unwrap();
        assert_eq!(output.values["RSI14"], 100.0);
        assert_eq!(output.vote, Vote::Bearish);
    }

    #[test]
    fn test_rsi_monotonic_fall_reaches_0() {
        let output = Rsi::default().calculate(&downtrend(60)).unwrap();
        assert_eq!(output.values["RSI14"], 0.0);
        assert_eq!(output.vote, Vote::Bullish);
    }

    #[test]
    fn test_rsi_flat_is_neutral() {
        let output = Rsi::default().calculate(&flat(30, 100.0)).unwrap();
        assert_eq!(output.values["RSI14"], 50.0);
        assert_eq!(output.vote, Vote::Neutral);
    }

    #[test]
    fn test_rsi_value_range_on_zigzag() {
        let candles: Vec<Candle> = (0..80)
            .map(|i| {
                let price = 100.0 + ((i * 7) % 11) as f64 - 5.0;
                Candle::flat(i as i64 * 60_000, price, 1.0)
            })
            .collect();
        for end in 15..candles.len() {
            let value = Rsi::calculate_rsi(&candles[..end], 14).unwrap();
            assert!((0.0..=100.0).contains(&value), "RSI out of range: {}", value);
        }
    }
}
