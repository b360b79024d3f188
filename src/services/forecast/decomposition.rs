//! Additive trend + seasonal decomposition forecaster.

use super::{ForecastError, Projection, Z_95};
use crate::config::ForecastConfig;

/// closes = linear trend + seasonal profile + residual.
#[derive(Debug, Clone)]
pub struct DecompositionForecaster {
    pub season_length: usize,
    pub min_history: usize,
    pub trust: f64,
}

impl DecompositionForecaster {
    pub fn from_config(config: &ForecastConfig) -> Self {
        Self {
            season_length: config.season_length,
            min_history: config.decomposition_min_history.max(3),
            trust: config.decomposition_trust,
        }
    }

    pub fn fit(&self, closes: &[f64]) -> Result<DecompositionFit, ForecastError> {
        let n = closes.len();
        if n < 3 {
            return Err(ForecastError::ModelFailure {
                model: "decomposition".to_string(),
                reason: "series too short for a trend".to_string(),
            });
        }

        let (intercept, slope) = linear_trend(closes);
        let detrended: Vec<f64> = closes
            .iter()
            .enumerate()
            .map(|(t, y)| y - (intercept + slope * t as f64))
            .collect();

        // Seasonality only with at least two full periods
        let period = self.season_length;
        let seasonal = if period > 1 && n >= 2 * period {
            seasonal_profile(&detrended, period)
        } else {
            Vec::new()
        };

        let residual_ss: f64 = detrended
            .iter()
            .enumerate()
            .map(|(t, d)| {
                let s = season_at(&seasonal, t);
                (d - s).powi(2)
            })
            .sum();
        let sigma = (residual_ss / (n - 2) as f64).sqrt();

        Ok(DecompositionFit {
            intercept,
            slope,
            seasonal,
            sigma,
            len: n,
        })
    }
}

/// Fitted decomposition.
#[derive(Debug, Clone)]
pub struct DecompositionFit {
    pub intercept: f64,
    pub slope: f64,
    /// Mean-zero seasonal offsets indexed by `t % period`; empty without seasonality.
    pub seasonal: Vec<f64>,
    /// Residual standard deviation.
    pub sigma: f64,
    len: usize,
}

impl DecompositionFit {
    pub fn project(&self, horizon: usize) -> Vec<Projection> {
        let n = self.len as f64;
        (1..=horizon)
            .map(|h| {
                let t = self.len - 1 + h;
                let price = self.intercept + self.slope * t as f64 + season_at(&self.seasonal, t);
                let se = self.sigma * (1.0 + h as f64 / n).sqrt();
                Projection {
                    price,
                    half_width: Z_95 * se,
                }
            })
            .collect()
    }
}

fn season_at(seasonal: &[f64], t: usize) -> f64 {
    if seasonal.is_empty() {
        0.0
    } else {
        seasonal[t % seasonal.len()]
    }
}

/// OLS line through (t, y_t). Returns (intercept, slope).
fn linear_trend(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let t_mean = (n - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var = 0.0;
    for (t, y) in values.iter().enumerate() {
        let dt = t as f64 - t_mean;
        cov += dt * (y - y_mean);
        var += dt * dt;
    }

    let slope = if var > 0.0 { cov / var } else { 0.0 };
    (y_mean - slope * t_mean, slope)
}

/// Average detrended value per season position, centred on zero.
fn seasonal_profile(detrended: &[f64], period: usize) -> Vec<f64> {
    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (t, value) in detrended.iter().enumerate() {
        sums[t % period] += value;
        counts[t % period] += 1;
    }

    let mut profile: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();

    let avg = profile.iter().sum::<f64>() / period as f64;
    for s in &mut profile {
        *s -= avg;
    }
    profile
}
