use serde::{Deserialize, Serialize};

/// Forecaster model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Autoregressive fit on differenced closes.
    Arima,
    /// Additive trend + seasonal decomposition.
    Decomposition,
    /// Learned sequence model over a lookback window.
    Sequence,
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Arima => "arima",
            ModelKind::Decomposition => "decomposition",
            ModelKind::Sequence => "sequence",
        }
    }
}

/// One forecast step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    pub timestamp: i64,
    pub predicted_price: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl ForecastPoint {
    pub fn width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }
}

/// Output of a single forecaster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    pub model: String,
    pub kind: ModelKind,
    /// Non-empty, one point per horizon step.
    pub points: Vec<ForecastPoint>,
    /// Prior trust in [0, 1].
    pub trust_weight: f64,
}

impl ForecastResult {
    /// Mean interval width across the horizon.
    pub fn mean_width(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.points.iter().map(|p| p.width()).sum::<f64>() / self.points.len() as f64
    }
}

/// Weight a surviving model received in the ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelContribution {
    pub model: String,
    pub kind: ModelKind,
    pub weight: f64,
    pub trust_weight: f64,
    pub mean_width: f64,
}

/// A forecaster excluded from the ensemble for this request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFailure {
    pub model: String,
    pub reason: String,
}

/// Inverse-uncertainty weighted combination of forecaster outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsembleForecast {
    /// Combined path; bounds are predicted ± combined width / 2.
    pub points: Vec<ForecastPoint>,
    /// Combined (weighted RMS) interval width per step.
    pub bound_widths: Vec<f64>,
    pub models: Vec<ModelContribution>,
    pub failures: Vec<ModelFailure>,
    /// Price the forecast starts from.
    pub current_price: f64,
    /// Trend strength in [-1, 1].
    pub trend_strength: f64,
}

impl EnsembleForecast {
    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.model.as_str()).collect()
    }

    /// Sum of model weights.
    pub fn weight_sum(&self) -> f64 {
        self.models.iter().map(|m| m.weight).sum()
    }

    /// True when every numeric field is finite.
    pub fn is_finite(&self) -> bool {
        self.current_price.is_finite()
            && self.trend_strength.is_finite()
            && self.bound_widths.iter().all(|w| w.is_finite())
            && self.points.iter().all(|p| {
                p.predicted_price.is_finite() && p.lower_bound.is_finite() && p.upper_bound.is_finite()
            })
            && self.models.iter().all(|m| m.weight.is_finite() && m.mean_width.is_finite())
    }
}
