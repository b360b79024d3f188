//! MACD (Moving Average Convergence Divergence) indicator.

use super::ema::ema_series;
use crate::services::signals::{make_reading, Indicator};
use crate::types::{closes, Candle, IndicatorCategory, IndicatorReading, Vote};

/// MACD indicator.
///
/// Shows the relationship between two EMAs:
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
/// - Histogram = MACD Line - Signal Line
///
/// Bullish when the histogram turns positive on the latest candle,
/// bearish when it turns negative.
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self::new(12, 26, 9)
    }
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            signal_period,
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        "MACD"
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Trend
    }

    fn min_periods(&self) -> usize {
        self.slow_period + self.signal_period
    }

    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading> {
        if candles.len() < self.min_periods() || self.fast_period > self.slow_period {
            return None;
        }

        let closes = closes(candles);

        let fast_ema = ema_series(&closes, self.fast_period);
        let slow_ema = ema_series(&closes, self.slow_period);

        if fast_ema.is_empty() || slow_ema.is_empty() {
            return None;
        }

        // Align the EMAs (fast starts earlier)
        let offset = self.slow_period - self.fast_period;
        let macd_line: Vec<f64> = fast_ema
            .iter()
            .skip(offset)
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect();

        let signal_line = ema_series(&macd_line, self.signal_period);
        if signal_line.len() < 2 {
            return None;
        }

        // Signal line is aligned with the tail of the MACD line
        let macd = macd_line[macd_line.len() - 1];
        let signal = signal_line[signal_line.len() - 1];
        let histogram = macd - signal;
        let prev_histogram =
            macd_line[macd_line.len() - 2] - signal_line[signal_line.len() - 2];

        let vote = if prev_histogram <= 0.0 && histogram > 0.0 {
            Vote::Bullish
        } else if prev_histogram >= 0.0 && histogram < 0.0 {
            Vote::Bearish
        } else {
            Vote::Neutral
        };

        Some(make_reading(
            self.name(),
            self.category(),
            &[
                ("MACD", macd),
                ("MACD_signal", signal),
                ("MACD_hist", histogram),
            ],
            vote,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_support::{flat, from_closes, uptrend};

    #[test]
    fn test_macd_name() {
        let macd = Macd::default();
        assert_eq!(macd.name(), "MACD");
        assert_eq!(macd.min_periods(), 35);
    }

    #[test]
    fn test_macd_insufficient_data() {
        assert!(Macd::default().calculate(&uptrend(34)).is_none());
        assert!(Macd::default().calculate(&uptrend(35)).is_some());
    }

    #[test]
    fn test_macd_flat_is_neutral() {
        let output = Macd::default().calculate(&flat(50, 100.0)).unwrap();
        assert_eq!(output.vote, Vote::Neutral);
        assert_eq!(output.values["MACD"], 0.0);
        assert_eq!(output.values["MACD_hist"], 0.0);
    }

    #[test]
    fn test_macd_bullish_histogram_cross() {
        // Accelerating decline keeps the histogram negative, then a sharp rally
        let mut closes: Vec<f64> = (0..50).map(|i| 200.0 - 0.05 * (i * i) as f64).collect();
        closes.push(200.0);
        let output = Macd::default().calculate(&from_closes(&closes)).unwrap();
        assert!(output.values["MACD_hist"] > 0.0);
        assert_eq!(output.vote, Vote::Bullish);
    }

    #[test]
    fn test_macd_bearish_histogram_cross() {
        let mut closes: Vec<f64> = (0..50).map(|i| 100.0 + 0.05 * (i * i) as f64).collect();
        closes.push(100.0);
        let output = Macd::default().calculate(&from_closes(&closes)).unwrap();
        assert!(output.values["MACD_hist"] < 0.0);
        assert_eq!(output.vote, Vote::Bearish);
    }

    #[test]
    fn test_macd_histogram_identity() {
        let output = Macd::default().calculate(&uptrend(80)).unwrap();
        let v = &output.values;
        assert!((v["MACD"] - v["MACD_signal"] - v["MACD_hist"]).abs() < 1e-12);
    }
}
