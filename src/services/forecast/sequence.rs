//! Small learned sequence forecaster.
//!
//! One hidden tanh layer over a window of min-max normalized closes, trained
//! by per-sample gradient descent and rolled forward recursively.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

use super::{ForecastError, Projection, Z_95};
use crate::config::ForecastConfig;

/// Share of samples used for training; the rest validates.
const TRAIN_SPLIT: f64 = 0.8;

#[derive(Debug, Clone)]
pub struct SequenceForecaster {
    pub lookback: usize,
    pub hidden: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    pub seed: u64,
    pub trust: f64,
}

impl SequenceForecaster {
    pub fn from_config(config: &ForecastConfig) -> Self {
        Self {
            lookback: config.sequence_lookback.max(1),
            hidden: config.sequence_hidden.max(1),
            epochs: config.sequence_epochs,
            learning_rate: config.sequence_learning_rate,
            seed: config.sequence_seed,
            trust: config.sequence_trust,
        }
    }

    pub fn min_history(&self) -> usize {
        (2 * self.lookback).max(self.lookback + 2)
    }

    /// Train, stopping with [`ForecastError::Timeout`] if `deadline` passes
    /// between epochs.
    pub fn fit_until(
        &self,
        closes: &[f64],
        deadline: Option<Instant>,
    ) -> Result<SequenceFit, ForecastError> {
        let started = Instant::now();
        let n = closes.len();
        let last_price = *closes.last().ok_or_else(|| self.failure("empty series"))?;

        let min = closes.iter().copied().fold(f64::INFINITY, f64::min);
        let max = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;
        if !(range > 0.0) {
            return Ok(SequenceFit::flat(last_price));
        }

        let normalized: Vec<f64> = closes.iter().map(|c| (c - min) / range).collect();
        let samples: Vec<(&[f64], f64)> = (self.lookback..n)
            .map(|t| (&normalized[t - self.lookback..t], normalized[t]))
            .collect();
        if samples.len() < 2 {
            return Err(self.failure("not enough samples"));
        }

        let split = ((samples.len() as f64 * TRAIN_SPLIT).round() as usize).clamp(1, samples.len() - 1);
        let (train, validation) = samples.split_at(split);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut network = Network::new(self.lookback, self.hidden, &mut rng);
        for _ in 0..self.epochs {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(ForecastError::Timeout {
                    model: "sequence".to_string(),
                    ms: started.elapsed().as_millis() as u64,
                });
            }
            for (x, y) in train {
                network.train_step(x, *y, self.learning_rate);
            }
        }

        let mse = validation
            .iter()
            .map(|(x, y)| (network.predict(x) - y).powi(2))
            .sum::<f64>()
            / validation.len() as f64;
        let rmse = mse.sqrt();
        if !rmse.is_finite() {
            return Err(self.failure("training diverged"));
        }

        Ok(SequenceFit {
            network: Some(network),
            window: normalized[n - self.lookback..].to_vec(),
            min,
            range,
            rmse: rmse * range,
            last_price,
        })
    }

    fn failure(&self, reason: &str) -> ForecastError {
        ForecastError::ModelFailure {
            model: "sequence".to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Trained network plus the window it continues from.
#[derive(Debug, Clone)]
pub struct SequenceFit {
    network: Option<Network>,
    /// Most recent normalized closes, oldest first.
    window: Vec<f64>,
    min: f64,
    range: f64,
    /// Validation RMSE in price units.
    pub rmse: f64,
    last_price: f64,
}

impl SequenceFit {
    /// Constant series: nothing to learn.
    fn flat(price: f64) -> Self {
        Self {
            network: None,
            window: Vec::new(),
            min: price,
            range: 0.0,
            rmse: 0.0,
            last_price: price,
        }
    }

    pub fn project(&self, horizon: usize) -> Vec<Projection> {
        let Some(network) = &self.network else {
            return vec![
                Projection {
                    price: self.last_price,
                    half_width: 0.0,
                };
                horizon
            ];
        };

        let mut window = self.window.clone();
        (1..=horizon)
            .map(|h| {
                let next = network.predict(&window);
                window.remove(0);
                window.push(next);
                Projection {
                    price: self.min + next * self.range,
                    half_width: Z_95 * self.rmse * (h as f64).sqrt(),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
struct Network {
    /// hidden × inputs
    w1: Vec<Vec<f64>>,
    b1: Vec<f64>,
    w2: Vec<f64>,
    b2: f64,
}

impl Network {
    fn new(inputs: usize, hidden: usize, rng: &mut StdRng) -> Self {
        let s1 = 1.0 / (inputs as f64).sqrt();
        let s2 = 1.0 / (hidden as f64).sqrt();
        Self {
            w1: (0..hidden)
                .map(|_| (0..inputs).map(|_| rng.gen_range(-s1..s1)).collect())
                .collect(),
            b1: vec![0.0; hidden],
            w2: (0..hidden).map(|_| rng.gen_range(-s2..s2)).collect(),
            b2: 0.0,
        }
    }

    fn hidden(&self, x: &[f64]) -> Vec<f64> {
        self.w1
            .iter()
            .zip(&self.b1)
            .map(|(row, b)| {
                let z: f64 = row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + b;
                z.tanh()
            })
            .collect()
    }

    fn output(&self, h: &[f64]) -> f64 {
        self.w2.iter().zip(h).map(|(w, v)| w * v).sum::<f64>() + self.b2
    }

    fn predict(&self, x: &[f64]) -> f64 {
        self.output(&self.hidden(x))
    }

    /// One SGD step on squared error.
    fn train_step(&mut self, x: &[f64], target: f64, learning_rate: f64) {
        let h = self.hidden(x);
        let error = self.output(&h) - target;

        for j in 0..self.w2.len() {
            let grad_hidden = error * self.w2[j] * (1.0 - h[j] * h[j]);
            self.w2[j] -= learning_rate * error * h[j];
            for (w, v) in self.w1[j].iter_mut().zip(x) {
                *w -= learning_rate * grad_hidden * v;
            }
            self.b1[j] -= learning_rate * grad_hidden;
        }
        self.b2 -= learning_rate * error;
    }
}
