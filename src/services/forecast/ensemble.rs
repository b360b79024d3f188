use futures_util::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{FitCache, ForecastError, Forecaster};
use crate::config::ForecastConfig;
use crate::types::{
    Candle, CandleInterval, EnsembleForecast, ForecastPoint, ForecastResult, ModelContribution,
    ModelFailure,
};

/// Floor for interval widths so zero-width forecasts keep finite weights.
const WIDTH_EPSILON: f64 = 1e-9;

/// Runs every forecaster concurrently and combines the survivors.
pub struct ForecastEnsemble {
    forecasters: Vec<Arc<Forecaster>>,
    cache: Arc<FitCache>,
    horizon: usize,
    model_timeout: Duration,
}

impl ForecastEnsemble {
    pub fn new(config: &ForecastConfig, cache: Arc<FitCache>) -> Self {
        Self::with_forecasters(
            Forecaster::all(config),
            cache,
            config.horizon,
            Duration::from_millis(config.model_timeout_ms),
        )
    }

    pub fn with_forecasters(
        forecasters: Vec<Forecaster>,
        cache: Arc<FitCache>,
        horizon: usize,
        model_timeout: Duration,
    ) -> Self {
        Self {
            forecasters: forecasters.into_iter().map(Arc::new).collect(),
            cache,
            horizon,
            model_timeout,
        }
    }

    pub fn cache(&self) -> &Arc<FitCache> {
        &self.cache
    }

    /// Forecast `horizon` steps past the last candle.
    ///
    /// Each forecaster runs on the blocking pool under its own timeout. A
    /// forecaster that fails or times out is left out of the combination and
    /// listed in `failures`. The same timeout is handed to the fit as a
    /// deadline, so a timed-out fit stops training and is not cached.
    pub async fn forecast(
        &self,
        symbol: &str,
        interval: CandleInterval,
        candles: Arc<[Candle]>,
    ) -> Result<EnsembleForecast, ForecastError> {
        let timeout_ms = self.model_timeout.as_millis() as u64;

        let tasks = self.forecasters.iter().map(|forecaster| {
            let forecaster = forecaster.clone();
            let candles = candles.clone();
            let cache = self.cache.clone();
            let symbol = symbol.to_string();
            let horizon = self.horizon;
            let model_timeout = self.model_timeout;

            async move {
                let name = forecaster.name();
                let deadline = Instant::now() + model_timeout;
                let handle = tokio::task::spawn_blocking(move || {
                    forecaster.forecast_until(
                        &symbol,
                        interval,
                        &candles,
                        horizon,
                        &cache,
                        Some(deadline),
                    )
                });

                let outcome = match tokio::time::timeout(model_timeout, handle).await {
                    Ok(Ok(Err(ForecastError::Timeout { .. }))) => Err(ForecastError::Timeout {
                        model: name.to_string(),
                        ms: timeout_ms,
                    }),
                    Ok(Ok(result)) => result,
                    Ok(Err(e)) => Err(ForecastError::ModelFailure {
                        model: name.to_string(),
                        reason: format!("task failed: {}", e),
                    }),
                    Err(_) => Err(ForecastError::Timeout {
                        model: name.to_string(),
                        ms: timeout_ms,
                    }),
                };
                (name, outcome)
            }
        });

        let mut results = Vec::new();
        let mut failures = Vec::new();
        for (name, outcome) in join_all(tasks).await {
            match outcome {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Forecaster {} excluded for {} {}: {}", name, symbol, interval, e);
                    failures.push(ModelFailure {
                        model: name.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let current_price = candles.last().map(|c| c.close).unwrap_or(0.0);
        let ensemble = combine(&results, failures, current_price)?;
        debug!(
            "Ensemble for {} {} from {:?}, trend {:.3}",
            symbol,
            interval,
            ensemble.model_names(),
            ensemble.trend_strength
        );
        Ok(ensemble)
    }
}

/// Inverse-uncertainty weighted combination.
///
/// Weight ∝ trust / mean width, renormalized over the survivors. The combined
/// width per step is the weighted RMS of the model widths.
pub fn combine(
    results: &[ForecastResult],
    failures: Vec<ModelFailure>,
    current_price: f64,
) -> Result<EnsembleForecast, ForecastError> {
    if results.is_empty() {
        return Err(ForecastError::NoForecastAvailable { failures });
    }

    let raw: Vec<f64> = results
        .iter()
        .map(|r| r.trust_weight.max(0.0) / r.mean_width().max(WIDTH_EPSILON))
        .collect();
    let total: f64 = raw.iter().sum();
    let weights: Vec<f64> = if total > 0.0 && total.is_finite() {
        raw.iter().map(|w| w / total).collect()
    } else {
        vec![1.0 / results.len() as f64; results.len()]
    };

    let steps = results.iter().map(|r| r.points.len()).min().unwrap_or(0);
    let mut points = Vec::with_capacity(steps);
    let mut bound_widths = Vec::with_capacity(steps);
    for step in 0..steps {
        let mut price = 0.0;
        let mut width_sq = 0.0;
        for (result, w) in results.iter().zip(&weights) {
            let point = &result.points[step];
            price += w * point.predicted_price;
            width_sq += w * point.width().powi(2);
        }
        let width = width_sq.sqrt();
        points.push(ForecastPoint {
            timestamp: results[0].points[step].timestamp,
            predicted_price: price,
            lower_bound: price - width / 2.0,
            upper_bound: price + width / 2.0,
        });
        bound_widths.push(width);
    }

    let trend = match (points.last(), bound_widths.last()) {
        (Some(last), Some(&width)) => trend_strength(current_price, last.predicted_price, width),
        _ => 0.0,
    };

    let models = results
        .iter()
        .zip(&weights)
        .map(|(r, &weight)| ModelContribution {
            model: r.model.clone(),
            kind: r.kind,
            weight,
            trust_weight: r.trust_weight,
            mean_width: r.mean_width(),
        })
        .collect();

    Ok(EnsembleForecast {
        points,
        bound_widths,
        models,
        failures,
        current_price,
        trend_strength: trend,
    })
}

/// Expected move measured in combined interval widths, clamped to [-1, 1].
pub fn trend_strength(current_price: f64, final_price: f64, final_width: f64) -> f64 {
    let delta = final_price - current_price;
    if final_width > 0.0 {
        (delta / (2.0 * final_width)).clamp(-1.0, 1.0)
    } else if delta > 0.0 {
        1.0
    } else if delta < 0.0 {
        -1.0
    } else {
        0.0
    }
}
