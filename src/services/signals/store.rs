//! Signal store for running analyses and keeping signal history.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::services::candle_store::CandleFeed;
use crate::services::forecast::FitCache;
use crate::services::signals::SignalGenerator;
use crate::types::{AnalysisReport, CandleInterval, SeriesStamp, Signal};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Last report for a key and the series it was computed from.
struct CachedReport {
    report: AnalysisReport,
    stamp: SeriesStamp,
    lookback: usize,
}

/// What an invalidation removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invalidated {
    pub reports: usize,
    pub fits: usize,
}

/// Runs analyses against a candle feed, reuses the last report while the
/// analysed candles are unchanged and keeps a bounded signal history per
/// symbol/interval.
pub struct SignalStore {
    feed: Arc<dyn CandleFeed>,
    generator: SignalGenerator,
    /// Cache key format: "{symbol}:{interval}"
    reports: DashMap<String, CachedReport>,
    history: DashMap<String, VecDeque<Signal>>,
    history_size: usize,
    default_lookback: usize,
}

impl SignalStore {
    /// Create a new signal store.
    pub fn new(
        feed: Arc<dyn CandleFeed>,
        config: AnalysisConfig,
        default_lookback: usize,
        history_size: usize,
    ) -> Arc<Self> {
        let generator = SignalGenerator::new(config, Arc::new(FitCache::new()));
        Self::with_generator(feed, generator, default_lookback, history_size)
    }

    pub fn with_generator(
        feed: Arc<dyn CandleFeed>,
        generator: SignalGenerator,
        default_lookback: usize,
        history_size: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            feed,
            generator,
            reports: DashMap::new(),
            history: DashMap::new(),
            history_size: history_size.max(1),
            default_lookback: default_lookback.max(1),
        })
    }

    fn key(symbol: &str, interval: CandleInterval) -> String {
        format!("{}:{}", symbol.to_lowercase(), interval)
    }

    /// Analyse the latest candles for a symbol.
    ///
    /// Returns the cached report when the feed still holds exactly the candles
    /// of the last analysis with the same lookback.
    pub async fn analyze(
        &self,
        symbol: &str,
        interval: CandleInterval,
        lookback: Option<usize>,
    ) -> Result<AnalysisReport, AnalysisError> {
        self.analyze_tracked(symbol, interval, lookback)
            .await
            .map(|(report, _)| report)
    }

    /// Like [`SignalStore::analyze`], also reporting whether the cached
    /// report was reused.
    pub async fn analyze_tracked(
        &self,
        symbol: &str,
        interval: CandleInterval,
        lookback: Option<usize>,
    ) -> Result<(AnalysisReport, bool), AnalysisError> {
        let lookback = lookback.unwrap_or(self.default_lookback).max(1);
        let key = Self::key(symbol, interval);
        let candles = self.feed.get_series(symbol, interval, lookback);
        let Some(stamp) = SeriesStamp::of(&candles) else {
            return Err(AnalysisError::EmptySeries);
        };

        if let Some(cached) = self.reports.get(&key) {
            if cached.stamp == stamp && cached.lookback == lookback {
                debug!("Reusing report for {}", key);
                return Ok((cached.report.clone(), true));
            }
        }

        debug!("Analysing {} with {} candles", key, stamp.len);
        let report = self
            .generator
            .analyze(&symbol.to_uppercase(), interval, candles)
            .await?;

        self.record(&key, report.signal.clone());
        self.reports.insert(
            key,
            CachedReport {
                report: report.clone(),
                stamp,
                lookback,
            },
        );
        Ok((report, false))
    }

    fn record(&self, key: &str, signal: Signal) {
        let mut history = self.history.entry(key.to_string()).or_default();
        history.push_back(signal);
        while history.len() > self.history_size {
            history.pop_front();
        }
    }

    /// Most recent signals, newest first.
    pub fn history(&self, symbol: &str, interval: CandleInterval, limit: usize) -> Vec<Signal> {
        self.history
            .get(&Self::key(symbol, interval))
            .map(|h| h.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn latest(&self, symbol: &str, interval: CandleInterval) -> Option<Signal> {
        self.history
            .get(&Self::key(symbol, interval))
            .and_then(|h| h.back().cloned())
    }

    /// Drop the cached report and cached forecaster fits for a key.
    pub fn invalidate(&self, symbol: &str, interval: CandleInterval) -> Invalidated {
        let reports = usize::from(self.reports.remove(&Self::key(symbol, interval)).is_some());
        let fits = self.generator.fit_cache().invalidate(symbol, interval);
        debug!(
            "Invalidated {} {}: {} report(s), {} fit(s)",
            symbol, interval, reports, fits
        );
        Invalidated { reports, fits }
    }

    pub fn fit_cache(&self) -> &Arc<FitCache> {
        self.generator.fit_cache()
    }
}
