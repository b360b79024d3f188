//! Runs every configured indicator over a candle series.

use tracing::debug;

use super::indicators::all_indicators;
use super::Indicator;
use crate::config::IndicatorConfig;
use crate::types::{Candle, IndicatorReading, IndicatorSnapshot};

/// Computes an [`IndicatorSnapshot`] for a candle series.
///
/// Indicators without enough history, or whose computation produced a
/// non-finite value, are reported as unavailable instead of being computed
/// on a shorter window.
pub struct IndicatorEngine {
    indicators: Vec<Box<dyn Indicator>>,
}

impl IndicatorEngine {
    pub fn new(config: &IndicatorConfig) -> Self {
        Self {
            indicators: all_indicators(config),
        }
    }

    /// Engine over an explicit indicator set.
    pub fn with_indicators(indicators: Vec<Box<dyn Indicator>>) -> Self {
        Self { indicators }
    }

    /// Largest minimum history across all indicators.
    pub fn max_min_periods(&self) -> usize {
        self.indicators
            .iter()
            .map(|i| i.min_periods())
            .max()
            .unwrap_or(0)
    }

    pub fn compute(&self, candles: &[Candle]) -> IndicatorSnapshot {
        let readings = self
            .indicators
            .iter()
            .map(|indicator| self.reading_for(indicator.as_ref(), candles))
            .collect();
        IndicatorSnapshot::new(readings)
    }

    fn reading_for(&self, indicator: &dyn Indicator, candles: &[Candle]) -> IndicatorReading {
        let unavailable = || IndicatorReading::unavailable(indicator.name(), indicator.category());

        if candles.len() < indicator.min_periods() {
            debug!(
                "{} needs {} candles, have {}",
                indicator.name(),
                indicator.min_periods(),
                candles.len()
            );
            return unavailable();
        }

        match indicator.calculate(candles) {
            Some(reading) if reading.values.values().all(|v| v.is_finite()) => reading,
            Some(_) => {
                debug!("{} produced a non-finite value", indicator.name());
                unavailable()
            }
            None => unavailable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::make_reading;
    use crate::services::signals::test_support::{flat, uptrend};
    use crate::types::{IndicatorCategory, Vote};

    struct Broken;

    impl Indicator for Broken {
        fn name(&self) -> &str {
            "BROKEN"
        }

        fn category(&self) -> IndicatorCategory {
            IndicatorCategory::Trend
        }

        fn min_periods(&self) -> usize {
            1
        }

        fn calculate(&self, _candles: &[Candle]) -> Option<IndicatorReading> {
            Some(make_reading(
                "BROKEN",
                IndicatorCategory::Trend,
                &[("BROKEN", f64::NAN)],
                Vote::Bullish,
            ))
        }
    }

    #[test]
    fn test_engine_reports_every_indicator() {
        let engine = IndicatorEngine::new(&IndicatorConfig::default());
        let snapshot = engine.compute(&uptrend(100));
        assert_eq!(snapshot.readings.len(), 9);
        assert_eq!(snapshot.available_count(), 9);
    }

    #[test]
    fn test_engine_short_history_is_unavailable() {
        let engine = IndicatorEngine::new(&IndicatorConfig::default());
        let snapshot = engine.compute(&uptrend(20));
        // RSI (15), Bollinger (20), Stochastic (16), Williams (14), ATR (15), Volume (20)
        assert_eq!(snapshot.available_count(), 6);
        assert_eq!(snapshot.vote("MACD"), Vote::Unavailable);
        assert_eq!(snapshot.vote("SMA50"), Vote::Unavailable);
        assert!(snapshot.get("MACD").unwrap().values.is_empty());
    }

    #[test]
    fn test_engine_flat_series_is_neutral() {
        let engine = IndicatorEngine::new(&IndicatorConfig::default());
        let snapshot = engine.compute(&flat(60, 100.0));
        for reading in snapshot.available() {
            assert_eq!(reading.vote, Vote::Neutral, "{}", reading.name);
        }
    }

    #[test]
    fn test_engine_non_finite_becomes_unavailable() {
        let engine = IndicatorEngine::with_indicators(vec![Box::new(Broken)]);
        let snapshot = engine.compute(&flat(5, 1.0));
        assert_eq!(snapshot.vote("BROKEN"), Vote::Unavailable);
    }

    #[test]
    fn test_max_min_periods() {
        let engine = IndicatorEngine::new(&IndicatorConfig::default());
        assert_eq!(engine.max_min_periods(), 51);
    }
}
