//! Support and resistance detection from swing highs and lows.

use std::cmp::Ordering;

use crate::config::LevelConfig;
use crate::types::{Candle, LevelKind, SupportResistanceLevel};

/// A swing high or low.
#[derive(Debug, Clone, Copy)]
struct Touch {
    index: usize,
    price: f64,
}

/// Clusters swing points into support/resistance levels.
pub struct SupportResistanceDetector {
    config: LevelConfig,
}

impl SupportResistanceDetector {
    pub fn new(config: LevelConfig) -> Self {
        Self { config }
    }

    /// Levels ordered nearest to the latest close first.
    pub fn detect(&self, candles: &[Candle]) -> Vec<SupportResistanceLevel> {
        let candles = match self.config.lookback {
            Some(lookback) if lookback < candles.len() => &candles[candles.len() - lookback..],
            _ => candles,
        };
        let Some(current_price) = candles.last().map(|c| c.close) else {
            return Vec::new();
        };

        let mut touches = self.swing_points(candles);
        touches.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal));

        let mut levels: Vec<SupportResistanceLevel> = self
            .cluster(&touches)
            .into_iter()
            .map(|cluster| self.level_from(&cluster, candles, current_price))
            .collect();

        levels.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
        });
        levels.truncate(self.config.max_levels);
        levels
    }

    /// Strict swing highs and lows with a full neighbourhood.
    fn swing_points(&self, candles: &[Candle]) -> Vec<Touch> {
        let radius = self.config.radius;
        let mut touches = Vec::new();
        if radius == 0 || candles.len() < 2 * radius + 1 {
            return touches;
        }

        for i in radius..candles.len() - radius {
            let others = || (i - radius..=i + radius).filter(move |&j| j != i);

            if others().all(|j| candles[i].high > candles[j].high) {
                touches.push(Touch {
                    index: i,
                    price: candles[i].high,
                });
            }
            if others().all(|j| candles[i].low < candles[j].low) {
                touches.push(Touch {
                    index: i,
                    price: candles[i].low,
                });
            }
        }

        touches
    }

    /// Greedy clustering over price-sorted touches.
    fn cluster(&self, sorted: &[Touch]) -> Vec<Vec<Touch>> {
        let mut clusters: Vec<Vec<Touch>> = Vec::new();
        let mut sum = 0.0;

        for touch in sorted {
            if let Some(current) = clusters.last_mut() {
                let mean = sum / current.len() as f64;
                if mean != 0.0 && ((touch.price - mean) / mean).abs() <= self.config.tolerance {
                    current.push(*touch);
                    sum += touch.price;
                    continue;
                }
            }
            clusters.push(vec![*touch]);
            sum = touch.price;
        }

        clusters
    }

    fn level_from(
        &self,
        cluster: &[Touch],
        candles: &[Candle],
        current_price: f64,
    ) -> SupportResistanceLevel {
        let price = cluster.iter().map(|t| t.price).sum::<f64>() / cluster.len() as f64;

        // Direction of approach: the close `radius` candles before each touch
        let mut from_above = 0;
        let mut from_below = 0;
        for touch in cluster {
            let before = candles[touch.index - self.config.radius].close;
            if before > price {
                from_above += 1;
            } else if before < price {
                from_below += 1;
            }
        }

        let mut level = SupportResistanceLevel {
            price,
            strength: cluster.len() as u32,
            kind: classify(from_above, from_below, price, current_price),
            distance: 0.0,
        };
        level.distance = level.distance_from(current_price);
        level
    }
}

/// Majority of approaches wins; a tie goes by where price sits now.
fn classify(from_above: usize, from_below: usize, level: f64, current_price: f64) -> LevelKind {
    match from_above.cmp(&from_below) {
        Ordering::Greater => LevelKind::Support,
        Ordering::Less => LevelKind::Resistance,
        Ordering::Equal if current_price > level => LevelKind::Support,
        Ordering::Equal => LevelKind::Resistance,
    }
}
