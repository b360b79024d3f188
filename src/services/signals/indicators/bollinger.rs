//! Bollinger Bands indicator.

use crate::services::signals::{make_reading, Indicator};
use crate::types::{Candle, IndicatorCategory, IndicatorReading, Vote};

/// Bollinger Bands indicator.
///
/// Consists of:
/// - Middle band: SMA(20)
/// - Upper band: SMA + 2 * StdDev
/// - Lower band: SMA - 2 * StdDev
///
/// Close above the upper band is bearish, below the lower band bullish.
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
    name: String,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::new(20, 2.0)
    }
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        Self {
            period,
            std_dev_multiplier,
            name: format!("BB{}", period),
        }
    }

    /// Population standard deviation.
    fn std_dev(values: &[f64], mean: f64) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let variance: f64 =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        variance.sqrt()
    }
}

impl Indicator for BollingerBands {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Volatility
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading> {
        if self.period == 0 || candles.len() < self.period {
            return None;
        }

        let closes: Vec<f64> = candles
            .iter()
            .rev()
            .take(self.period)
            .map(|c| c.close)
            .collect();

        let middle = closes.iter().sum::<f64>() / self.period as f64;
        let std_dev = Self::std_dev(&closes, middle);

        let upper = middle + self.std_dev_multiplier * std_dev;
        let lower = middle - self.std_dev_multiplier * std_dev;
        let band_width = upper - lower;

        let current_price = candles.last()?.close;

        // %B > 1: above upper band, %B < 0: below lower band
        let percent_b = if band_width > 0.0 {
            (current_price - lower) / band_width
        } else {
            0.5
        };
        let width = if middle != 0.0 { band_width / middle } else { 0.0 };

        let vote = if current_price > upper {
            Vote::Bearish
        } else if current_price < lower {
            Vote::Bullish
        } else {
            Vote::Neutral
        };

        Some(make_reading(
            self.name(),
            self.category(),
            &[
                ("BB_upper", upper),
                ("BB_middle", middle),
                ("BB_lower", lower),
                ("BB_percent_b", percent_b),
                ("BB_width", width),
            ],
            vote,
        ))
    }
}
