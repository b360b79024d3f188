//! Turns indicator votes, the forecast trend and nearby levels into one score.

use std::cmp::Ordering;

use crate::config::FusionConfig;
use crate::types::{
    ContributingVote, Decision, EnsembleForecast, IndicatorSnapshot, LevelKind,
    SupportResistanceLevel,
};

/// Outcome of scoring one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    /// Composite score in [-1, 1].
    pub composite: f64,
    pub confidence: u8,
    pub decision: Decision,
    pub votes: Vec<ContributingVote>,
    pub rationale: Vec<String>,
}

/// Adjustment applied for levels close to the current price.
#[derive(Debug, Clone, PartialEq)]
pub struct Proximity {
    pub adjustment: f64,
    pub notes: Vec<String>,
}

pub struct ConfidenceCalculator {
    config: FusionConfig,
}

impl ConfidenceCalculator {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Mean vote score over available indicators, `None` when none are available.
    pub fn technical_score(&self, snapshot: &IndicatorSnapshot) -> Option<f64> {
        let scores: Vec<f64> = snapshot
            .readings
            .iter()
            .filter_map(|r| r.vote.score())
            .collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        }
    }

    /// Penalty for the nearest resistance and bonus for the nearest support
    /// within the proximity tolerance, scaled by closeness and strength.
    pub fn proximity_adjustment(&self, price: f64, levels: &[SupportResistanceLevel]) -> Proximity {
        let mut proximity = Proximity {
            adjustment: 0.0,
            notes: Vec::new(),
        };
        let tolerance = self.config.proximity_tolerance;
        if !(tolerance > 0.0) {
            return proximity;
        }

        for (kind, sign) in [(LevelKind::Resistance, -1.0), (LevelKind::Support, 1.0)] {
            let nearest = levels
                .iter()
                .filter(|l| l.kind == kind)
                .map(|l| (l, l.distance_from(price)))
                .filter(|(_, d)| d.is_finite() && *d <= tolerance)
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

            if let Some((level, distance)) = nearest {
                let closeness = 1.0 - distance / tolerance;
                let saturation = self.config.strength_saturation.max(1) as f64;
                let strength = (level.strength as f64 / saturation).min(1.0);
                let term = sign * self.config.proximity_max_penalty * closeness * strength;
                proximity.adjustment += term;
                proximity.notes.push(format!(
                    "{} {:.4} (strength {}, {:.2}% away): {:+.3}",
                    kind_label(kind),
                    level.price,
                    level.strength,
                    distance * 100.0,
                    term
                ));
            }
        }
        proximity
    }

    /// Score an analysis. Never fails: with no technical and no forecast
    /// opinion the result is HOLD at 50.
    pub fn assess(
        &self,
        snapshot: &IndicatorSnapshot,
        forecast: Option<&EnsembleForecast>,
        levels: &[SupportResistanceLevel],
        price: f64,
    ) -> Assessment {
        let technical = self.technical_score(snapshot);
        let trend = forecast
            .map(|f| f.trend_strength)
            .filter(|t| t.is_finite());

        let mut rationale = Vec::new();
        let (w_tech, w_forecast) = match (technical, trend) {
            (Some(_), Some(_)) => (self.config.technical_weight, self.config.forecast_weight),
            (Some(_), None) => {
                rationale.push("no forecast opinion: technical score carries full weight".to_string());
                (1.0, 0.0)
            }
            (None, Some(_)) => {
                rationale.push("no indicator available: forecast carries full weight".to_string());
                (0.0, 1.0)
            }
            (None, None) => (0.0, 0.0),
        };

        let available = snapshot.available_count();
        let total = snapshot.readings.len();
        if available < total {
            rationale.push(format!(
                "{} of {} indicators unavailable",
                total - available,
                total
            ));
        }

        let mut votes: Vec<ContributingVote> = snapshot
            .readings
            .iter()
            .map(|r| ContributingVote {
                name: r.name.clone(),
                score: r.vote.score().unwrap_or(0.0),
                weight: match r.vote.score() {
                    Some(_) if available > 0 => w_tech / available as f64,
                    _ => 0.0,
                },
                detail: r.vote.label().to_string(),
            })
            .collect();

        votes.push(ContributingVote {
            name: "technical".to_string(),
            score: technical.unwrap_or(0.0),
            weight: w_tech,
            detail: format!("{} of {} indicators voting", available, total),
        });
        votes.push(ContributingVote {
            name: "forecast".to_string(),
            score: trend.unwrap_or(0.0),
            weight: w_forecast,
            detail: match forecast {
                Some(f) if trend.is_some() => format!("models: {}", f.model_names().join(", ")),
                _ => "no forecast".to_string(),
            },
        });

        if technical.is_none() && trend.is_none() {
            votes.push(ContributingVote {
                name: "proximity".to_string(),
                score: 0.0,
                weight: 0.0,
                detail: "not applied".to_string(),
            });
            rationale.push("insufficient data".to_string());
            return Assessment {
                composite: 0.0,
                confidence: 50,
                decision: Decision::Hold,
                votes,
                rationale,
            };
        }

        let proximity = self.proximity_adjustment(price, levels);
        votes.push(ContributingVote {
            name: "proximity".to_string(),
            score: proximity.adjustment,
            weight: 1.0,
            detail: if proximity.notes.is_empty() {
                "no level nearby".to_string()
            } else {
                proximity.notes.join("; ")
            },
        });
        rationale.extend(proximity.notes);

        let raw = w_tech * technical.unwrap_or(0.0)
            + w_forecast * trend.unwrap_or(0.0)
            + proximity.adjustment;
        let composite = if raw.is_finite() { raw.clamp(-1.0, 1.0) } else { 0.0 };
        let confidence = confidence_from(composite);
        let decision = self.decide(confidence);

        rationale.push(format!(
            "composite {:+.3}, confidence {}: {}",
            composite,
            confidence,
            decision.label()
        ));

        Assessment {
            composite,
            confidence,
            decision,
            votes,
            rationale,
        }
    }

    pub fn decide(&self, confidence: u8) -> Decision {
        if confidence >= self.config.buy_threshold {
            Decision::Buy
        } else if confidence <= self.config.sell_threshold {
            Decision::Sell
        } else {
            Decision::Hold
        }
    }
}

/// Map a composite in [-1, 1] onto 0..=100.
pub fn confidence_from(composite: f64) -> u8 {
    if !composite.is_finite() {
        return 50;
    }
    (50.0 + 50.0 * composite).round().clamp(0.0, 100.0) as u8
}

fn kind_label(kind: LevelKind) -> &'static str {
    match kind {
        LevelKind::Support => "near support",
        LevelKind::Resistance => "near resistance",
    }
}
