//! Price forecasters and their inverse-uncertainty ensemble.
//!
//! Every forecaster is a variant of [`Forecaster`]: a closed set of model
//! families behind one fit/project contract.

pub mod arima;
pub mod cache;
pub mod decomposition;
pub mod ensemble;
pub mod sequence;

pub use arima::{ArimaFit, ArimaForecaster};
pub use cache::FitCache;
pub use decomposition::{DecompositionFit, DecompositionForecaster};
pub use ensemble::ForecastEnsemble;
pub use sequence::{SequenceFit, SequenceForecaster};

use std::time::Instant;
use thiserror::Error;

use crate::config::ForecastConfig;
use crate::types::{
    closes, Candle, CandleInterval, ForecastPoint, ForecastResult, ModelFailure, ModelKind,
    SeriesStamp,
};

/// z-score of the 95% interval.
pub const Z_95: f64 = 1.96;

/// Why a forecaster (or the whole ensemble) produced nothing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("{model} needs {required} candles, have {available}")]
    InsufficientData {
        model: String,
        required: usize,
        available: usize,
    },

    #[error("{model} failed: {reason}")]
    ModelFailure { model: String, reason: String },

    #[error("{model} timed out after {ms}ms")]
    Timeout { model: String, ms: u64 },

    #[error("no forecaster produced a result ({} failed)", failures.len())]
    NoForecastAvailable { failures: Vec<ModelFailure> },
}

/// One projected step: central price and half of the interval width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub price: f64,
    pub half_width: f64,
}

/// Fitted state of one forecaster. Self-contained: projecting needs no
/// access to the series it was fitted on.
#[derive(Debug, Clone)]
pub enum FittedModel {
    Arima(ArimaFit),
    Decomposition(DecompositionFit),
    Sequence(SequenceFit),
}

impl FittedModel {
    pub fn project(&self, horizon: usize) -> Vec<Projection> {
        match self {
            FittedModel::Arima(fit) => fit.project(horizon),
            FittedModel::Decomposition(fit) => fit.project(horizon),
            FittedModel::Sequence(fit) => fit.project(horizon),
        }
    }
}

/// A forecasting model family.
#[derive(Debug, Clone)]
pub enum Forecaster {
    Arima(ArimaForecaster),
    Decomposition(DecompositionForecaster),
    Sequence(SequenceForecaster),
}

impl Forecaster {
    /// Every model family, configured.
    pub fn all(config: &ForecastConfig) -> Vec<Forecaster> {
        vec![
            Forecaster::Decomposition(DecompositionForecaster::from_config(config)),
            Forecaster::Sequence(SequenceForecaster::from_config(config)),
            Forecaster::Arima(ArimaForecaster::from_config(config)),
        ]
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Forecaster::Arima(_) => ModelKind::Arima,
            Forecaster::Decomposition(_) => ModelKind::Decomposition,
            Forecaster::Sequence(_) => ModelKind::Sequence,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn trust_weight(&self) -> f64 {
        match self {
            Forecaster::Arima(f) => f.trust,
            Forecaster::Decomposition(f) => f.trust,
            Forecaster::Sequence(f) => f.trust,
        }
    }

    pub fn min_history(&self) -> usize {
        match self {
            Forecaster::Arima(f) => f.min_history,
            Forecaster::Decomposition(f) => f.min_history,
            Forecaster::Sequence(f) => f.min_history(),
        }
    }

    /// Fit on closing prices, oldest first, giving up once `deadline`
    /// passes. Only the iterative sequence model checks the deadline.
    pub fn fit_until(
        &self,
        closes: &[f64],
        deadline: Option<Instant>,
    ) -> Result<FittedModel, ForecastError> {
        if closes.len() < self.min_history() {
            return Err(ForecastError::InsufficientData {
                model: self.name().to_string(),
                required: self.min_history(),
                available: closes.len(),
            });
        }

        match self {
            Forecaster::Arima(f) => f.fit(closes).map(FittedModel::Arima),
            Forecaster::Decomposition(f) => f.fit(closes).map(FittedModel::Decomposition),
            Forecaster::Sequence(f) => f.fit_until(closes, deadline).map(FittedModel::Sequence),
        }
    }

    /// Fit (or reuse a fresh cached fit) and project `horizon` steps past the
    /// last candle. Blocking; callers run it off the async runtime.
    pub fn forecast(
        &self,
        symbol: &str,
        interval: CandleInterval,
        candles: &[Candle],
        horizon: usize,
        cache: &FitCache,
    ) -> Result<ForecastResult, ForecastError> {
        self.forecast_until(symbol, interval, candles, horizon, cache, None)
    }

    /// Like [`Forecaster::forecast`], abandoning a fit still running at
    /// `deadline`. An abandoned fit is never cached.
    pub fn forecast_until(
        &self,
        symbol: &str,
        interval: CandleInterval,
        candles: &[Candle],
        horizon: usize,
        cache: &FitCache,
        deadline: Option<Instant>,
    ) -> Result<ForecastResult, ForecastError> {
        let (Some(last), Some(stamp)) = (candles.last(), SeriesStamp::of(candles)) else {
            return Err(ForecastError::InsufficientData {
                model: self.name().to_string(),
                required: self.min_history(),
                available: 0,
            });
        };

        let fit = match cache.get(symbol, interval, self.kind(), &stamp) {
            Some(fit) => fit,
            None => {
                let fit = self.fit_until(&closes(candles), deadline)?;
                cache.insert(symbol, interval, self.kind(), stamp, fit)
            }
        };

        let step = interval.duration_ms();
        let points: Vec<ForecastPoint> = fit
            .project(horizon)
            .into_iter()
            .enumerate()
            .map(|(i, p)| ForecastPoint {
                timestamp: last.timestamp + step * (i as i64 + 1),
                predicted_price: p.price,
                lower_bound: p.price - p.half_width,
                upper_bound: p.price + p.half_width,
            })
            .collect();

        let finite = points.iter().all(|p| {
            p.predicted_price.is_finite() && p.lower_bound.is_finite() && p.upper_bound.is_finite()
        });
        if points.is_empty() || !finite {
            return Err(ForecastError::ModelFailure {
                model: self.name().to_string(),
                reason: "non-finite projection".to_string(),
            });
        }

        Ok(ForecastResult {
            model: self.name().to_string(),
            kind: self.kind(),
            points,
            trust_weight: self.trust_weight(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_support::{flat, uptrend};

    #[test]
    fn test_all_forecasters_trust_weights() {
        let forecasters = Forecaster::all(&ForecastConfig::default());
        assert_eq!(forecasters.len(), 3);
        let total: f64 = forecasters.iter().map(|f| f.trust_weight()).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_insufficient_history() {
        let arima = Forecaster::Arima(ArimaForecaster::from_config(&ForecastConfig::default()));
        let err = arima.fit_until(&[1.0; 10], None).unwrap_err();
        assert_eq!(
            err,
            ForecastError::InsufficientData {
                model: "arima".to_string(),
                required: 30,
                available: 10,
            }
        );
    }

    #[test]
    fn test_forecast_timestamps_step_by_interval() {
        let cache = FitCache::new();
        let forecaster =
            Forecaster::Decomposition(DecompositionForecaster::from_config(&ForecastConfig::default()));
        let candles = uptrend(60);
        let result = forecaster
            .forecast("btc", CandleInterval::OneHour, &candles, 5, &cache)
            .unwrap();
        let last = candles.last().unwrap().timestamp;
        assert_eq!(result.points.len(), 5);
        assert_eq!(result.points[0].timestamp, last + 3_600_000);
        assert_eq!(result.points[4].timestamp, last + 5 * 3_600_000);
        assert_eq!(result.kind, ModelKind::Decomposition);
    }

    #[test]
    fn test_forecast_reuses_cached_fit() {
        let cache = FitCache::new();
        let forecaster = Forecaster::Arima(ArimaForecaster::from_config(&ForecastConfig::default()));
        let candles = flat(40, 10.0);
        forecaster
            .forecast("eth", CandleInterval::OneHour, &candles, 3, &cache)
            .unwrap();
        assert_eq!(cache.len(), 1);
        forecaster
            .forecast("eth", CandleInterval::OneHour, &candles, 3, &cache)
            .unwrap();
        assert_eq!(cache.len(), 1);
    }
}
