use serde::{Deserialize, Serialize};

use super::{EnsembleForecast, IndicatorSnapshot, Signal, SupportResistanceLevel, Vote};
use crate::error::AnalysisError;

/// Everything one analysis request produced, in wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub signal: Signal,
    pub indicators: IndicatorSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<EnsembleForecast>,
    pub levels: Vec<SupportResistanceLevel>,
    /// Values that were not representable and got dropped at the boundary.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conversions: Vec<String>,
}

impl AnalysisReport {
    pub fn new(
        signal: Signal,
        indicators: IndicatorSnapshot,
        forecast: Option<EnsembleForecast>,
        levels: Vec<SupportResistanceLevel>,
    ) -> Self {
        Self {
            signal,
            indicators,
            forecast,
            levels,
            conversions: Vec::new(),
        }
        .sanitized()
    }

    /// Drop anything JSON cannot carry as a plain number.
    ///
    /// Non-finite indicator values make the reading unavailable, a
    /// non-finite forecast is removed entirely, non-finite levels are
    /// skipped. Each drop is recorded as an [`AnalysisError::Serialization`]
    /// in `conversions` and appended to the signal rationale.
    pub fn sanitized(mut self) -> Self {
        let before_conversions = self.conversions.len();

        for reading in &mut self.indicators.readings {
            let before = reading.values.len();
            reading.values.retain(|_, v| v.is_finite());
            if reading.values.len() != before {
                reading.values.clear();
                reading.vote = Vote::Unavailable;
                note(
                    &mut self.conversions,
                    format!("{}: non-finite value dropped", reading.name),
                );
            }
        }

        if let Some(forecast) = &self.forecast {
            if !forecast.is_finite() {
                self.forecast = None;
                note(
                    &mut self.conversions,
                    "forecast: non-finite values, forecast dropped".to_string(),
                );
            }
        }

        let before = self.levels.len();
        self.levels
            .retain(|l| l.price.is_finite() && l.distance.is_finite());
        if self.levels.len() != before {
            note(
                &mut self.conversions,
                format!("levels: {} non-finite level(s) dropped", before - self.levels.len()),
            );
        }

        let added = self.conversions[before_conversions..].to_vec();
        self.signal.rationale.extend(added);
        self
    }
}

fn note(conversions: &mut Vec<String>, what: String) {
    conversions.push(AnalysisError::Serialization(what).to_string());
}
