//! Trading signals service module.
//!
//! Provides technical indicator calculations, support/resistance detection,
//! confidence scoring and signal history.

pub mod confidence;
pub mod engine;
pub mod generator;
pub mod indicators;
pub mod levels;
pub mod risk;
pub mod store;

pub use confidence::ConfidenceCalculator;
pub use engine::IndicatorEngine;
pub use generator::SignalGenerator;
pub use levels::SupportResistanceDetector;
pub use store::SignalStore;

use std::collections::BTreeMap;

use crate::types::{Candle, IndicatorCategory, IndicatorReading, Vote};

/// Trait for implementing technical indicators.
pub trait Indicator: Send + Sync {
    /// Human-readable name, used as the reading name.
    fn name(&self) -> &str;

    /// Category this indicator belongs to.
    fn category(&self) -> IndicatorCategory;

    /// Minimum number of candle periods required for calculation.
    fn min_periods(&self) -> usize;

    /// Calculate the latest reading from candle data.
    /// Returns None if insufficient data or calculation fails.
    fn calculate(&self, candles: &[Candle]) -> Option<IndicatorReading>;
}

/// Helper to create an IndicatorReading.
pub fn make_reading(
    name: &str,
    category: IndicatorCategory,
    values: &[(&str, f64)],
    vote: Vote,
) -> IndicatorReading {
    IndicatorReading {
        name: name.to_string(),
        category,
        values: values
            .iter()
            .map(|(key, value)| (key.to_string(), *value))
            .collect::<BTreeMap<_, _>>(),
        vote,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::Candle;

    pub const HOUR_MS: i64 = 3_600_000;

    /// Hourly candles with the given closes. Open is the previous close.
    pub fn from_closes(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = if i == 0 { close } else { closes[i - 1] };
                Candle {
                    timestamp: i as i64 * HOUR_MS,
                    open,
                    high: open.max(close) + 0.5,
                    low: open.min(close) - 0.5,
                    close,
                    volume: 1_000.0,
                }
            })
            .collect()
    }

    /// Strictly rising closes starting at 100.
    pub fn uptrend(n: usize) -> Vec<Candle> {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64 * 1.5).collect();
        from_closes(&closes)
    }

    /// Strictly falling closes starting at 200.
    pub fn downtrend(n: usize) -> Vec<Candle> {
        let closes: Vec<f64> = (0..n).map(|i| 200.0 - i as f64 * 1.5).collect();
        from_closes(&closes)
    }

    /// Identical flat candles.
    pub fn flat(n: usize, price: f64) -> Vec<Candle> {
        (0..n)
            .map(|i| Candle::flat(i as i64 * HOUR_MS, price, 1_000.0))
            .collect()
    }
}
