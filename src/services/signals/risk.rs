//! Stop-loss and target derivation from detected levels.

use std::cmp::Ordering;

use crate::config::RiskConfig;
use crate::types::{Decision, LevelKind, SupportResistanceLevel};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskLevels {
    pub stop_loss: f64,
    pub target: f64,
    pub risk_reward: f64,
}

/// Risk envelope for a decision. HOLD has none.
///
/// BUY protects below the nearest support under the price and aims at the
/// nearest resistance above it; SELL mirrors that. Missing levels fall back
/// to fixed percentages of the price.
pub fn risk_levels(
    config: &RiskConfig,
    decision: Decision,
    price: f64,
    levels: &[SupportResistanceLevel],
) -> Option<RiskLevels> {
    if !(price > 0.0) || !price.is_finite() {
        return None;
    }

    let below = |kind: LevelKind| {
        levels
            .iter()
            .filter(|l| l.kind == kind && l.price < price)
            .map(|l| l.price)
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
    };
    let above = |kind: LevelKind| {
        levels
            .iter()
            .filter(|l| l.kind == kind && l.price > price)
            .map(|l| l.price)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
    };

    let (stop_loss, target) = match decision {
        Decision::Hold => return None,
        Decision::Buy => (
            below(LevelKind::Support)
                .map(|s| s * (1.0 - config.stop_buffer))
                .unwrap_or(price * (1.0 - config.fallback_stop_pct)),
            above(LevelKind::Resistance).unwrap_or(price * (1.0 + config.fallback_target_pct)),
        ),
        Decision::Sell => (
            above(LevelKind::Resistance)
                .map(|r| r * (1.0 + config.stop_buffer))
                .unwrap_or(price * (1.0 + config.fallback_stop_pct)),
            below(LevelKind::Support).unwrap_or(price * (1.0 - config.fallback_target_pct)),
        ),
    };

    let risk = (price - stop_loss).abs();
    let risk_reward = if risk > 0.0 {
        (target - price).abs() / risk
    } else {
        0.0
    };

    Some(RiskLevels {
        stop_loss,
        target,
        risk_reward,
    })
}
