use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::CandleInterval;

/// Directional opinion of a single indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vote {
    Bullish,
    Bearish,
    Neutral,
    /// Not enough history (or a degenerate computation). No opinion.
    Unavailable,
}

impl Vote {
    /// Numeric score of the vote, `None` when the indicator has no opinion.
    pub fn score(&self) -> Option<f64> {
        match self {
            Vote::Bullish => Some(1.0),
            Vote::Bearish => Some(-1.0),
            Vote::Neutral => Some(0.0),
            Vote::Unavailable => None,
        }
    }

    /// Get display label for this vote.
    pub fn label(&self) -> &'static str {
        match self {
            Vote::Bullish => "Bullish",
            Vote::Bearish => "Bearish",
            Vote::Neutral => "Neutral",
            Vote::Unavailable => "Unavailable",
        }
    }
}

/// Category of a technical indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorCategory {
    Trend,
    Momentum,
    Volatility,
    Volume,
}

/// Latest values and vote of one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorReading {
    /// Indicator name (e.g., "RSI14", "MACD").
    pub name: String,
    pub category: IndicatorCategory,
    /// Named values, e.g. "MACD", "MACD_signal", "MACD_hist".
    pub values: BTreeMap<String, f64>,
    pub vote: Vote,
}

impl IndicatorReading {
    /// Reading with no values and no opinion.
    pub fn unavailable(name: impl Into<String>, category: IndicatorCategory) -> Self {
        Self {
            name: name.into(),
            category,
            values: BTreeMap::new(),
            vote: Vote::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        self.vote != Vote::Unavailable
    }
}

/// Indicator readings computed for one candle series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSnapshot {
    pub readings: Vec<IndicatorReading>,
}

impl IndicatorSnapshot {
    pub fn new(readings: Vec<IndicatorReading>) -> Self {
        Self { readings }
    }

    /// Readings that carry a real vote.
    pub fn available(&self) -> impl Iterator<Item = &IndicatorReading> {
        self.readings.iter().filter(|r| r.is_available())
    }

    pub fn available_count(&self) -> usize {
        self.available().count()
    }

    /// Find a reading by indicator name.
    pub fn get(&self, name: &str) -> Option<&IndicatorReading> {
        self.readings.iter().find(|r| r.name == name)
    }

    /// Vote of an indicator, `Unavailable` if it is not part of the snapshot.
    pub fn vote(&self, name: &str) -> Vote {
        self.get(name).map(|r| r.vote).unwrap_or(Vote::Unavailable)
    }

    /// Flattened value map across all readings.
    pub fn values(&self) -> BTreeMap<String, f64> {
        self.readings
            .iter()
            .flat_map(|r| r.values.iter().map(|(k, v)| (k.clone(), *v)))
            .collect()
    }
}

/// Trading decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

impl Decision {
    /// Get display label.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Buy => "Buy",
            Decision::Sell => "Sell",
            Decision::Hold => "Hold",
        }
    }
}

/// Named sub-score that contributed to a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributingVote {
    pub name: String,
    /// Score in [-1, 1] (proximity adjustments may be smaller).
    pub score: f64,
    /// Weight applied in the composite; 0 for excluded inputs.
    pub weight: f64,
    pub detail: String,
}

/// A scored trading signal. Built once per analysis and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub id: Uuid,
    /// Unix timestamp (milliseconds) when generated.
    pub timestamp: i64,
    /// Open time of the last candle analysed.
    pub candle_timestamp: i64,
    pub symbol: String,
    pub interval: CandleInterval,
    pub decision: Decision,
    /// Confidence from 0 (certain sell) to 100 (certain buy); 50 is undecided.
    pub confidence: u8,
    /// Composite score in [-1, 1].
    pub composite: f64,
    pub contributing_votes: Vec<ContributingVote>,
    /// Degradations and notes, in the order they were recorded.
    pub rationale: Vec<String>,
    pub suggested_stop_loss: Option<f64>,
    pub suggested_target: Option<f64>,
    pub risk_reward: Option<f64>,
    pub price_at_signal: f64,
}
