use crate::types::{Candle, CandleInterval};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Source of ordered candle series.
pub trait CandleFeed: Send + Sync {
    /// The most recent `lookback` candles, oldest first.
    fn get_series(&self, symbol: &str, interval: CandleInterval, lookback: usize) -> Vec<Candle>;
}

/// Summary of one stored series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesInfo {
    pub symbol: String,
    pub interval: CandleInterval,
    pub count: usize,
    pub last_timestamp: Option<i64>,
}

/// In-memory candle feed.
///
/// Candles are merged by timestamp (a later write replaces the candle with the
/// same open time), kept ascending and bounded per series.
pub struct CandleStore {
    data: DashMap<(String, CandleInterval), BTreeMap<i64, Candle>>,
    capacity: usize,
}

impl CandleStore {
    /// Create a new candle store.
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            data: DashMap::new(),
            capacity: capacity.max(1),
        })
    }

    fn key(symbol: &str, interval: CandleInterval) -> (String, CandleInterval) {
        (symbol.to_lowercase(), interval)
    }

    /// Merge candles into a series. Returns the number of candles now stored.
    pub fn merge(&self, symbol: &str, interval: CandleInterval, candles: Vec<Candle>) -> usize {
        let received = candles.len();
        let mut series = self.data.entry(Self::key(symbol, interval)).or_default();
        for candle in candles {
            series.insert(candle.timestamp, candle);
        }
        while series.len() > self.capacity {
            series.pop_first();
        }

        debug!(
            "Merged {} candles into {} {} ({} stored)",
            received,
            symbol,
            interval,
            series.len()
        );
        series.len()
    }

    /// Stored series, sorted by symbol then interval.
    pub fn series(&self) -> Vec<SeriesInfo> {
        let mut series: Vec<SeriesInfo> = self
            .data
            .iter()
            .map(|entry| {
                let (symbol, interval) = entry.key();
                SeriesInfo {
                    symbol: symbol.clone(),
                    interval: *interval,
                    count: entry.value().len(),
                    last_timestamp: entry.value().keys().next_back().copied(),
                }
            })
            .collect();
        series.sort_by(|a, b| {
            a.symbol
                .cmp(&b.symbol)
                .then(a.interval.duration_ms().cmp(&b.interval.duration_ms()))
        });
        series
    }
}

impl CandleFeed for CandleStore {
    fn get_series(&self, symbol: &str, interval: CandleInterval, lookback: usize) -> Vec<Candle> {
        let Some(series) = self.data.get(&Self::key(symbol, interval)) else {
            return Vec::new();
        };
        let skip = series.len().saturating_sub(lookback);
        series.values().skip(skip).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(timestamp: i64, close: f64) -> Candle {
        Candle::flat(timestamp, close, 1.0)
    }

    #[test]
    fn test_merge_sorts_and_replaces() {
        let store = CandleStore::new(100);
        store.merge(
            "BTC",
            CandleInterval::OneHour,
            vec![candle(3, 3.0), candle(1, 1.0), candle(2, 2.0)],
        );
        let count = store.merge("btc", CandleInterval::OneHour, vec![candle(2, 20.0)]);
        assert_eq!(count, 3);

        let series = store.get_series("btc", CandleInterval::OneHour, 10);
        let closes: Vec<f64> = series.iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![1.0, 20.0, 3.0]);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let store = CandleStore::new(3);
        let candles = (0..5).map(|i| candle(i, i as f64)).collect();
        assert_eq!(store.merge("eth", CandleInterval::OneDay, candles), 3);
        let series = store.get_series("eth", CandleInterval::OneDay, 10);
        assert_eq!(series.first().unwrap().timestamp, 2);
    }

    #[test]
    fn test_lookback_takes_tail() {
        let store = CandleStore::new(100);
        let candles = (0..10).map(|i| candle(i, i as f64)).collect();
        store.merge("sol", CandleInterval::OneHour, candles);
        let series = store.get_series("sol", CandleInterval::OneHour, 4);
        assert_eq!(series.len(), 4);
        assert_eq!(series[0].timestamp, 6);
        assert_eq!(series[3].timestamp, 9);
    }

    #[test]
    fn test_unknown_series_is_empty() {
        let store = CandleStore::new(100);
        assert!(store.get_series("nope", CandleInterval::OneHour, 10).is_empty());
        assert!(store.series().is_empty());
    }

    #[test]
    fn test_series_listing() {
        let store = CandleStore::new(100);
        store.merge("eth", CandleInterval::OneHour, vec![candle(5, 1.0)]);
        store.merge("btc", CandleInterval::OneDay, vec![candle(7, 1.0)]);
        store.merge("btc", CandleInterval::OneHour, vec![candle(9, 1.0)]);
        let series = store.series();
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].symbol, "btc");
        assert_eq!(series[0].interval, CandleInterval::OneHour);
        assert_eq!(series[1].interval, CandleInterval::OneDay);
        assert_eq!(series[2].last_timestamp, Some(5));
    }
}
