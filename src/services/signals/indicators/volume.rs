//! Volume ratio indicator.

use crate::services::signals::{make_reading, Indicator};
use crate::types::{Candle, IndicatorCategory, IndicatorReading, Vote};

/// Latest volume relative to its moving average.
///
/// A spike (ratio above `spike`) follows the direction of the candle body.
pub struct VolumeRatio {
    period: usize,
    spike: f64,
    name: String,
}

impl Default for VolumeRatio {
    fn default() -> Self {
        Self::new(20, 2.0)
    }
}

impl VolumeRatio {
    pub fn new(period: usize, spike: f64) -> Self {
        Self {
            period,
            spike,
            name: format!("VOL{}", period),
        }
    }
}

impl Indicator for VolumeRatio {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Volume
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading> {
        if self.period == 0 || candles.len() < self.period {
            return None;
        }

        let window = &candles[candles.len() - self.period..];
        let average = window.iter().map(|c| c.volume).sum::<f64>() / self.period as f64;
        if average <= 0.0 {
            return None;
        }

        let last = candles.last()?;
        let ratio = last.volume / average;

        let vote = if ratio > self.spike {
            if last.close > last.open {
                Vote::Bullish
            } else if last.close < last.open {
                Vote::Bearish
            } else {
                Vote::Neutral
            }
        } else {
            Vote::Neutral
        };

        Some(make_reading(
            self.name(),
            self.category(),
            &[("VOL_ratio", ratio), ("VOL_avg", average)],
            vote,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_support::{flat, from_closes};

    fn with_last_volume(mut candles: Vec<Candle>, volume: f64) -> Vec<Candle> {
        if let Some(last) = candles.last_mut() {
            last.volume = volume;
        }
        candles
    }

    #[test]
    fn test_volume_name() {
        let vol = VolumeRatio::default();
        assert_eq!(vol.name(), "VOL20");
        assert_eq!(vol.category(), IndicatorCategory::Volume);
    }

    #[test]
    fn test_volume_steady_ratio_is_one() {
        let output = VolumeRatio::default().calculate(&flat(25, 10.0)).unwrap();
        assert!((output.values["VOL_ratio"] - 1.0).abs() < 1e-12);
        assert_eq!(output.vote, Vote::Neutral);
    }

    #[test]
    fn test_volume_spike_on_up_candle_is_bullish() {
        let mut closes = vec![100.0; 24];
        closes.push(102.0);
        let candles = with_last_volume(from_closes(&closes), 10_000.0);
        let output = VolumeRatio::default().calculate(&candles).unwrap();
        assert!(output.values["VOL_ratio"] > 2.0);
        assert_eq!(output.vote, Vote::Bullish);
    }

    #[test]
    fn test_volume_spike_on_down_candle_is_bearish() {
        let mut closes = vec![100.0; 24];
        closes.push(98.0);
        let candles = with_last_volume(from_closes(&closes), 10_000.0);
        let output = VolumeRatio::default().calculate(&candles).unwrap();
        assert_eq!(output.vote, Vote::Bearish);
    }

    #[test]
    fn test_volume_zero_average_is_unavailable() {
        let candles: Vec<Candle> = flat(25, 10.0)
            .into_iter()
            .map(|mut c| {
                c.volume = 0.0;
                c
            })
            .collect();
        assert!(VolumeRatio::default().calculate(&candles).is_none());
    }
}
