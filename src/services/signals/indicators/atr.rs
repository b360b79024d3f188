//! Average True Range (ATR) indicator.

use crate::services::signals::{make_reading, Indicator};
use crate::types::{Candle, IndicatorCategory, IndicatorReading, Vote};

/// ATR (Average True Range) indicator.
///
/// Measures market volatility by calculating the average of true ranges:
/// TR = max(High-Low, |High-PrevClose|, |Low-PrevClose|)
///
/// Only votes on a volatility expansion: when the latest true range exceeds
/// `expansion` × ATR, the vote follows the latest close-to-close move.
pub struct Atr {
    period: usize,
    expansion: f64,
    name: String,
}

impl Default for Atr {
    fn default() -> Self {
        Self::new(14, 1.5)
    }
}

impl Atr {
    pub fn new(period: usize, expansion: f64) -> Self {
        Self {
            period,
            expansion,
            name: format!("ATR{}", period),
        }
    }

    /// Calculate True Range.
    fn true_range(current: &Candle, previous: &Candle) -> f64 {
        let hl = current.high - current.low;
        let hc = (current.high - previous.close).abs();
        let lc = (current.low - previous.close).abs();
        hl.max(hc).max(lc)
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Volatility
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading> {
        if self.period == 0 || candles.len() < self.min_periods() {
            return None;
        }

        let true_ranges: Vec<f64> = candles
            .windows(2)
            .map(|pair| Self::true_range(&pair[1], &pair[0]))
            .collect();

        // Wilder's smoothing
        let initial_atr: f64 =
            true_ranges.iter().take(self.period).sum::<f64>() / self.period as f64;
        let mut atr = initial_atr;
        for tr in true_ranges.iter().skip(self.period) {
            atr = (atr * (self.period - 1) as f64 + tr) / self.period as f64;
        }

        let last = candles.last()?;
        let prev = &candles[candles.len() - 2];
        let atr_pct = (atr / last.close) * 100.0;
        let latest_tr = *true_ranges.last()?;

        let vote = if atr > 0.0 && latest_tr > self.expansion * atr {
            if last.close > prev.close {
                Vote::Bullish
            } else if last.close < prev.close {
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
            &[(self.name(), atr), ("ATR_pct", atr_pct)],
            vote,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_support::{flat, from_closes, uptrend};

    #[test]
    fn test_atr_name() {
        let atr = Atr::default();
        assert_eq!(atr.name(), "ATR14");
        assert_eq!(atr.category(), IndicatorCategory::Volatility);
        assert_eq!(atr.min_periods(), 15);
    }

    #[test]
    fn test_atr_insufficient_data() {
        assert!(Atr::default().calculate(&uptrend(14)).is_none());
    }

    #[test]
    fn test_atr_steady_trend_is_neutral() {
        let output = Atr::default().calculate(&uptrend(40)).unwrap();
        assert!(output.values["ATR14"] > 0.0);
        assert!(output.values["ATR_pct"] > 0.0);
        assert_eq!(output.vote, Vote::Neutral);
    }

    #[test]
    fn test_atr_expansion_up_is_bullish() {
        let mut closes = vec![100.0; 20];
        closes.push(110.0);
        let output = Atr::default().calculate(&from_closes(&closes)).unwrap();
        assert_eq!(output.vote, Vote::Bullish);
    }

    #[test]
    fn test_atr_expansion_down_is_bearish() {
        let mut closes = vec![100.0; 20];
        closes.push(90.0);
        let output = Atr::default().calculate(&from_closes(&closes)).unwrap();
        assert_eq!(output.vote, Vote::Bearish);
    }

    #[test]
    fn test_atr_flat_is_zero_and_neutral() {
        let output = Atr::default().calculate(&flat(20, 100.0)).unwrap();
        assert_eq!(output.values["ATR14"], 0.0);
        assert_eq!(output.vote, Vote::Neutral);
    }
}
