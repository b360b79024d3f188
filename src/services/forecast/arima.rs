//! ARIMA(p, 1, 0) forecaster.

use nalgebra::{DMatrix, DVector};

use super::{ForecastError, Projection, Z_95};
use crate::config::ForecastConfig;

/// Relative determinant below which the normal equations count as singular.
const SINGULAR_RATIO: f64 = 1e-10;

/// Autoregressive fit of order `p` on first differences of closes.
#[derive(Debug, Clone)]
pub struct ArimaForecaster {
    pub order: usize,
    pub min_history: usize,
    pub trust: f64,
}

impl ArimaForecaster {
    pub fn from_config(config: &ForecastConfig) -> Self {
        Self {
            order: config.arima_order,
            min_history: config.arima_min_history.max(config.arima_order + 3),
            trust: config.arima_trust,
        }
    }

    pub fn fit(&self, closes: &[f64]) -> Result<ArimaFit, ForecastError> {
        let last_price = *closes.last().ok_or_else(|| self.failure("empty series"))?;
        let diffs = difference(closes);
        let p = self.order;

        if diffs.len() < p + 2 {
            return Err(self.failure("not enough differences"));
        }

        match estimate_ar(&diffs, p) {
            Some((intercept, phi, sigma)) => {
                let recent_diffs = diffs[diffs.len() - p..].to_vec();
                Ok(ArimaFit {
                    intercept,
                    phi,
                    sigma,
                    last_price,
                    recent_diffs,
                })
            }
            None => {
                // Singular regression (e.g. a flat or perfectly linear series)
                let intercept = diffs.iter().sum::<f64>() / diffs.len() as f64;
                let variance = diffs.iter().map(|d| (d - intercept).powi(2)).sum::<f64>()
                    / diffs.len() as f64;
                Ok(ArimaFit::drift(last_price, intercept, variance.sqrt()))
            }
        }
    }

    fn failure(&self, reason: &str) -> ForecastError {
        ForecastError::ModelFailure {
            model: "arima".to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Fitted ARIMA(p, 1, 0) state.
#[derive(Debug, Clone)]
pub struct ArimaFit {
    pub intercept: f64,
    /// AR coefficients φ1..φp on the differenced series.
    pub phi: Vec<f64>,
    /// Residual standard deviation.
    pub sigma: f64,
    last_price: f64,
    /// Last `p` differences, oldest first.
    recent_diffs: Vec<f64>,
}

impl ArimaFit {
    /// Intercept-only random walk with drift.
    pub fn drift(last_price: f64, intercept: f64, sigma: f64) -> Self {
        Self {
            intercept,
            phi: Vec::new(),
            sigma,
            last_price,
            recent_diffs: Vec::new(),
        }
    }

    pub fn project(&self, horizon: usize) -> Vec<Projection> {
        let p = self.phi.len();
        let mut diffs = self.recent_diffs.clone();
        let mut price = self.last_price;
        let psi = self.psi_weights(horizon);

        let mut cumulative = 0.0;
        (0..horizon)
            .map(|h| {
                let mut next = self.intercept;
                for (i, phi) in self.phi.iter().enumerate() {
                    next += phi * diffs[diffs.len() - 1 - i];
                }
                if p > 0 {
                    diffs.push(next);
                }
                price += next;

                cumulative += psi[h] * psi[h];
                Projection {
                    price,
                    half_width: Z_95 * self.sigma * cumulative.sqrt(),
                }
            })
            .collect()
    }

    /// ψ-weights of the integrated process.
    ///
    /// Price follows y_t = c + Σ a_k y_{t-k} + e_t with a_1 = 1 + φ1,
    /// a_k = φk − φ(k−1) and a_(p+1) = −φp.
    fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        let p = self.phi.len();
        let mut a = vec![0.0; p + 1];
        a[0] = 1.0 + self.phi.first().copied().unwrap_or(0.0);
        for k in 1..p {
            a[k] = self.phi[k] - self.phi[k - 1];
        }
        if p > 0 {
            a[p] = -self.phi[p - 1];
        }

        let mut psi = Vec::with_capacity(horizon);
        for j in 0..horizon {
            if j == 0 {
                psi.push(1.0);
                continue;
            }
            let value: f64 = (1..=j.min(p + 1)).map(|k| a[k - 1] * psi[j - k]).sum();
            psi.push(value);
        }
        psi
    }
}

/// First differences.
pub fn difference(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|w| w[1] - w[0]).collect()
}

/// OLS of d_t on [1, d_{t-1}, .., d_{t-p}]. Returns (intercept, φ, σ), or None
/// when the normal equations are singular.
fn estimate_ar(data: &[f64], p: usize) -> Option<(f64, Vec<f64>, f64)> {
    let n = data.len();
    if p == 0 || n < p + 2 {
        return None;
    }
    let rows = n - p;

    let mut x_data = Vec::with_capacity(rows * (p + 1));
    for t in p..n {
        x_data.push(1.0);
        for i in 1..=p {
            x_data.push(data[t - i]);
        }
    }

    let x = DMatrix::from_row_slice(rows, p + 1, &x_data);
    let y = DVector::from_column_slice(&data[p..]);

    let xtx = x.transpose() * &x;
    let diagonal: f64 = xtx.diagonal().iter().product();
    if diagonal <= 0.0 || xtx.determinant().abs() / diagonal < SINGULAR_RATIO {
        return None;
    }

    let beta = xtx.try_inverse()? * (x.transpose() * &y);
    if beta.iter().any(|b| !b.is_finite()) {
        return None;
    }

    let residuals = &y - &x * &beta;
    let dof = if rows > p + 1 { rows - p - 1 } else { rows };
    let sigma = (residuals.iter().map(|r| r * r).sum::<f64>() / dof as f64).sqrt();

    let intercept = beta[0];
    let phi = beta.iter().skip(1).copied().collect();
    Some((intercept, phi, sigma))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecaster() -> ArimaForecaster {
        ArimaForecaster::from_config(&ForecastConfig::default())
    }

    /// Deterministic noisy random walk.
    fn noisy_walk(n: usize) -> Vec<f64> {
        let mut price = 100.0;
        (0..n)
            .map(|i| {
                price += ((i * 37 % 11) as f64 - 5.0) * 0.3 + 0.1;
                price
            })
            .collect()
    }

    #[test]
    fn test_difference() {
        assert_eq!(difference(&[1.0, 3.0, 6.0]), vec![2.0, 3.0]);
        assert!(difference(&[1.0]).is_empty());
    }

    #[test]
    fn test_flat_series_falls_back_to_drift() {
        let fit = forecaster().fit(&[50.0; 40]).unwrap();
        assert!(fit.phi.is_empty());
        assert_eq!(fit.intercept, 0.0);
        let projection = fit.project(5);
        assert!(projection.iter().all(|p| p.price == 50.0 && p.half_width == 0.0));
    }

    #[test]
    fn test_linear_series_continues_slope() {
        let closes: Vec<f64> = (0..40).map(|i| 10.0 + 2.0 * i as f64).collect();
        let fit = forecaster().fit(&closes).unwrap();
        let projection = fit.project(3);
        assert!((projection[0].price - 90.0).abs() < 1e-9);
        assert!((projection[2].price - 94.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounds_widen_with_horizon() {
        let fit = forecaster().fit(&noisy_walk(120)).unwrap();
        assert_eq!(fit.phi.len(), 2);
        let projection = fit.project(24);
        assert_eq!(projection.len(), 24);
        assert!(projection[0].half_width > 0.0);
        for pair in projection.windows(2) {
            assert!(pair[1].half_width >= pair[0].half_width);
        }
    }

    #[test]
    fn test_drift_psi_weights_are_ones() {
        let fit = ArimaFit::drift(100.0, 1.0, 2.0);
        let projection = fit.project(4);
        // se_h = σ√h
        let expected = Z_95 * 2.0 * 4f64.sqrt();
        assert!((projection[3].half_width - expected).abs() < 1e-12);
        assert!((projection[3].price - 104.0).abs() < 1e-12);
    }

    #[test]
    fn test_psi_weights_ar1() {
        let fit = ArimaFit {
            intercept: 0.0,
            phi: vec![0.5],
            sigma: 1.0,
            last_price: 100.0,
            recent_diffs: vec![0.0],
        };
        // a = [1.5, -0.5]: ψ = 1, 1.5, 1.75
        let psi = fit.psi_weights(3);
        assert_eq!(psi, vec![1.0, 1.5, 1.75]);
    }
}
