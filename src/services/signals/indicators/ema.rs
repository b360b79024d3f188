//! Exponential Moving Average (EMA) crossover indicator.

use crate::services::signals::{make_reading, Indicator};
use crate::types::{closes, Candle, IndicatorCategory, IndicatorReading, Vote};

/// EMA series seeded with the SMA of the first `period` values.
///
/// The result has `values.len() - period + 1` entries, the first aligned with
/// `values[period - 1]`. Empty when there is not enough data.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut ema = Vec::with_capacity(values.len() - period + 1);

    let seed: f64 = values.iter().take(period).sum::<f64>() / period as f64;
    ema.push(seed);

    let mut last = seed;
    for value in &values[period..] {
        last = (value - last) * multiplier + last;
        ema.push(last);
    }

    ema
}

/// Fast/slow EMA crossover.
///
/// - Fast EMA crosses above slow EMA on the latest candle (golden cross): bullish
/// - Fast EMA crosses below slow EMA (death cross): bearish
pub struct EmaCross {
    fast_period: usize,
    slow_period: usize,
    name: String,
}

impl Default for EmaCross {
    fn default() -> Self {
        Self::new(12, 26)
    }
}

impl EmaCross {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            name: format!("EMA{}_{}", fast_period, slow_period),
        }
    }
}

impl Indicator for EmaCross {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Trend
    }

    fn min_periods(&self) -> usize {
        self.fast_period.max(self.slow_period) + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading> {
        if candles.len() < self.min_periods() {
            return None;
        }

        let closes = closes(candles);
        let fast = ema_series(&closes, self.fast_period);
        let slow = ema_series(&closes, self.slow_period);
        if fast.len() < 2 || slow.len() < 2 {
            return None;
        }

        let (fast_now, fast_prev) = (fast[fast.len() - 1], fast[fast.len() - 2]);
        let (slow_now, slow_prev) = (slow[slow.len() - 1], slow[slow.len() - 2]);

        let vote = if fast_prev <= slow_prev && fast_now > slow_now {
            Vote::Bullish
        } else if fast_prev >= slow_prev && fast_now < slow_now {
            Vote::Bearish
        } else {
            Vote::Neutral
        };

        let fast_key = format!("EMA{}", self.fast_period);
        let slow_key = format!("EMA{}", self.slow_period);
        Some(make_reading(
            self.name(),
            self.category(),
            &[(&fast_key, fast_now), (&slow_key, slow_now)],
            vote,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_support::{flat, from_closes, uptrend};

    #[test]
    fn test_ema_series_seed_and_length() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ema = ema_series(&values, 3);
        assert_eq!(ema.len(), 3);
        assert_eq!(ema[0], 2.0);
        // multiplier 0.5: (4 - 2) * 0.5 + 2 = 3
        assert_eq!(ema[1], 3.0);
        assert_eq!(ema[2], 4.0);
    }

    #[test]
    fn test_ema_series_insufficient() {
        assert!(ema_series(&[1.0, 2.0], 3).is_empty());
        assert!(ema_series(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn test_ema_cross_min_periods() {
        assert_eq!(EmaCross::default().min_periods(), 27);
        assert!(EmaCross::default().calculate(&uptrend(20)).is_none());
    }

    #[test]
    fn test_ema_cross_steady_trend_is_neutral() {
        // Already crossed long ago, no fresh crossover
        let output = EmaCross::default().calculate(&uptrend(60)).unwrap();
        assert_eq!(output.vote, Vote::Neutral);
        assert!(output.values["EMA12"] > output.values["EMA26"]);
    }

    #[test]
    fn test_ema_cross_golden_cross() {
        // Long decline, then a sharp final jump pulls the fast EMA over the slow one
        let mut closes: Vec<f64> = (0..40).map(|i| 200.0 - i as f64).collect();
        closes.push(300.0);
        let output = EmaCross::default().calculate(&from_closes(&closes)).unwrap();
        assert_eq!(output.vote, Vote::Bullish);
    }

    #[test]
    fn test_ema_cross_death_cross() {
        let mut closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        closes.push(10.0);
        let output = EmaCross::default().calculate(&from_closes(&closes)).unwrap();
        assert_eq!(output.vote, Vote::Bearish);
    }

    #[test]
    fn test_ema_cross_flat_is_neutral() {
        let output = EmaCross::default().calculate(&flat(30, 50.0)).unwrap();
        assert_eq!(output.vote, Vote::Neutral);
    }
}
