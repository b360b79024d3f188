//! Fuses indicators, the forecast ensemble and support/resistance levels into
//! a scored signal.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::confidence::ConfidenceCalculator;
use super::risk::risk_levels;
use super::{IndicatorEngine, SupportResistanceDetector};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::services::forecast::{FitCache, ForecastEnsemble, ForecastError};
use crate::types::{
    AnalysisReport, Candle, CandleInterval, EnsembleForecast, IndicatorSnapshot, Signal,
    SupportResistanceLevel,
};

/// Check that a series can be analysed at all.
///
/// Timestamps must strictly increase and consecutive candles may be at most
/// `gap_tolerance` intervals apart. Prices must be finite and positive.
pub fn validate_series(
    candles: &[Candle],
    interval: CandleInterval,
    gap_tolerance: f64,
) -> Result<(), AnalysisError> {
    if candles.is_empty() {
        return Err(AnalysisError::EmptySeries);
    }

    for candle in candles {
        let prices = [candle.open, candle.high, candle.low, candle.close];
        let valid = prices.iter().all(|p| p.is_finite() && *p > 0.0)
            && candle.volume.is_finite()
            && candle.volume >= 0.0;
        if !valid {
            return Err(AnalysisError::InvalidCandle {
                timestamp: candle.timestamp,
            });
        }
    }

    let allowed_ms = (interval.duration_ms() as f64 * gap_tolerance).round() as i64;
    for pair in candles.windows(2) {
        let gap_ms = pair[1].timestamp - pair[0].timestamp;
        if gap_ms <= 0 {
            return Err(AnalysisError::UnorderedSeries {
                timestamp: pair[1].timestamp,
            });
        }
        if gap_ms > allowed_ms {
            return Err(AnalysisError::DataGap {
                timestamp: pair[1].timestamp,
                gap_ms,
                allowed_ms,
            });
        }
    }
    Ok(())
}

/// Produces one [`AnalysisReport`] per candle series.
pub struct SignalGenerator {
    config: AnalysisConfig,
    engine: Arc<IndicatorEngine>,
    detector: Arc<SupportResistanceDetector>,
    ensemble: ForecastEnsemble,
    calculator: ConfidenceCalculator,
    component_timeout: Duration,
}

impl SignalGenerator {
    pub fn new(config: AnalysisConfig, cache: Arc<FitCache>) -> Self {
        let ensemble = ForecastEnsemble::new(&config.forecast, cache);
        Self::with_ensemble(config, ensemble)
    }

    /// Generator around an explicit ensemble.
    pub fn with_ensemble(config: AnalysisConfig, ensemble: ForecastEnsemble) -> Self {
        Self {
            engine: Arc::new(IndicatorEngine::new(&config.indicators)),
            detector: Arc::new(SupportResistanceDetector::new(config.levels.clone())),
            ensemble,
            calculator: ConfidenceCalculator::new(config.fusion.clone()),
            component_timeout: Duration::from_millis(config.forecast.component_timeout_ms),
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn fit_cache(&self) -> &Arc<FitCache> {
        self.ensemble.cache()
    }

    /// Analyse a validated series.
    ///
    /// Indicators, levels and the forecast run concurrently. Only an invalid
    /// series fails the request; a component that times out or fails is
    /// replaced by an empty result and noted in the rationale.
    pub async fn analyze(
        &self,
        symbol: &str,
        interval: CandleInterval,
        candles: Vec<Candle>,
    ) -> Result<AnalysisReport, AnalysisError> {
        validate_series(&candles, interval, self.config.gap_tolerance)?;
        let candles: Arc<[Candle]> = Arc::from(candles);

        let engine = self.engine.clone();
        let series = candles.clone();
        let indicators = run_blocking(self.component_timeout, move || engine.compute(&series));

        let detector = self.detector.clone();
        let series = candles.clone();
        let levels = run_blocking(self.component_timeout, move || detector.detect(&series));

        let forecast = self.ensemble.forecast(symbol, interval, candles.clone());

        let (indicators, levels, forecast) = tokio::join!(indicators, levels, forecast);

        let mut notes = Vec::new();
        let indicators = indicators.unwrap_or_else(|reason| {
            warn!("Indicators for {} {} unavailable: {}", symbol, interval, reason);
            notes.push(format!("indicators unavailable: {}", reason));
            IndicatorSnapshot::default()
        });
        let levels = levels.unwrap_or_else(|reason| {
            warn!("Levels for {} {} unavailable: {}", symbol, interval, reason);
            notes.push(format!("support/resistance unavailable: {}", reason));
            Vec::new()
        });
        let forecast = match forecast {
            Ok(forecast) => {
                for failure in &forecast.failures {
                    notes.push(format!(
                        "forecast model {} excluded: {}",
                        failure.model, failure.reason
                    ));
                }
                Some(forecast)
            }
            Err(ForecastError::NoForecastAvailable { failures }) => {
                let reasons: Vec<String> = failures
                    .iter()
                    .map(|f| format!("{} ({})", f.model, f.reason))
                    .collect();
                notes.push(format!("no forecast available: {}", reasons.join("; ")));
                None
            }
            Err(e) => {
                notes.push(format!("no forecast available: {}", e));
                None
            }
        };

        let last = candles.last().copied().ok_or(AnalysisError::EmptySeries)?;
        let signal = self.fuse(
            symbol,
            interval,
            &last,
            &indicators,
            forecast.as_ref(),
            &levels,
            notes,
        );

        info!(
            "Signal for {} {}: {} at {} (composite {:.3})",
            symbol,
            interval,
            signal.decision.label(),
            signal.confidence,
            signal.composite
        );

        Ok(AnalysisReport::new(signal, indicators, forecast, levels))
    }

    /// Score already computed components into a signal.
    ///
    /// `notes` are degradations recorded before fusion; they lead the
    /// rationale.
    #[allow(clippy::too_many_arguments)]
    pub fn fuse(
        &self,
        symbol: &str,
        interval: CandleInterval,
        last: &Candle,
        indicators: &IndicatorSnapshot,
        forecast: Option<&EnsembleForecast>,
        levels: &[SupportResistanceLevel],
        notes: Vec<String>,
    ) -> Signal {
        let price = last.close;
        let assessment = self.calculator.assess(indicators, forecast, levels, price);
        let risk = risk_levels(&self.config.risk, assessment.decision, price, levels);

        let mut rationale = notes;
        rationale.extend(assessment.rationale);

        debug!(
            "Fused {} {}: {} votes, composite {:.3}",
            symbol,
            interval,
            assessment.votes.len(),
            assessment.composite
        );

        Signal {
            id: Uuid::new_v4(),
            timestamp: Utc::now().timestamp_millis(),
            candle_timestamp: last.timestamp,
            symbol: symbol.to_string(),
            interval,
            decision: assessment.decision,
            confidence: assessment.confidence,
            composite: assessment.composite,
            contributing_votes: assessment.votes,
            rationale,
            suggested_stop_loss: risk.map(|r| r.stop_loss),
            suggested_target: risk.map(|r| r.target),
            risk_reward: risk.map(|r| r.risk_reward),
            price_at_signal: price,
        }
    }
}

/// Run a pure computation on the blocking pool under a timeout.
async fn run_blocking<T, F>(timeout: Duration, f: F) -> Result<T, String>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(f)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(format!("task failed: {}", e)),
        Err(_) => Err(format!("timed out after {}ms", timeout.as_millis())),
    }
}
