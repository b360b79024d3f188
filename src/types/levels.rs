use serde::{Deserialize, Serialize};

/// Whether a level acts as a floor or a ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelKind {
    Support,
    Resistance,
}

/// A clustered price level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportResistanceLevel {
    pub price: f64,
    /// Number of swing points in the cluster.
    pub strength: u32,
    pub kind: LevelKind,
    /// |price - current| / current at detection time.
    pub distance: f64,
}

impl SupportResistanceLevel {
    /// Relative distance from `price` to this level.
    pub fn distance_from(&self, price: f64) -> f64 {
        if price == 0.0 {
            return f64::INFINITY;
        }
        ((self.price - price) / price).abs()
    }
}
