use dashmap::DashMap;
use std::sync::Arc;

use super::FittedModel;
use crate::types::{CandleInterval, ModelKind, SeriesStamp};

type FitKey = (String, CandleInterval, ModelKind);

struct FitEntry {
    stamp: SeriesStamp,
    fit: Arc<FittedModel>,
}

/// Thread-safe cache of fitted forecasters keyed by (symbol, interval, model).
///
/// An entry is fresh only while the series it was fitted on is unchanged:
/// same last candle, same length and same contents. Fits are computed outside the map and
/// inserted whole, so a reader never sees a partial fit; two concurrent
/// misses may both fit and the later insert wins.
pub struct FitCache {
    data: DashMap<FitKey, FitEntry>,
}

impl Default for FitCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FitCache {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    fn key(symbol: &str, interval: CandleInterval, kind: ModelKind) -> FitKey {
        (symbol.to_lowercase(), interval, kind)
    }

    /// Get a fit if it was computed from the series with this stamp.
    pub fn get(
        &self,
        symbol: &str,
        interval: CandleInterval,
        kind: ModelKind,
        stamp: &SeriesStamp,
    ) -> Option<Arc<FittedModel>> {
        let entry = self.data.get(&Self::key(symbol, interval, kind))?;
        if entry.stamp == *stamp {
            Some(entry.fit.clone())
        } else {
            None
        }
    }

    /// Store a fit, replacing any previous one for the same key.
    pub fn insert(
        &self,
        symbol: &str,
        interval: CandleInterval,
        kind: ModelKind,
        stamp: SeriesStamp,
        fit: FittedModel,
    ) -> Arc<FittedModel> {
        let fit = Arc::new(fit);
        self.data.insert(
            Self::key(symbol, interval, kind),
            FitEntry {
                stamp,
                fit: fit.clone(),
            },
        );
        fit
    }

    /// Drop every fit for a symbol/interval. Returns the number removed.
    pub fn invalidate(&self, symbol: &str, interval: CandleInterval) -> usize {
        let symbol = symbol.to_lowercase();
        let before = self.data.len();
        self.data
            .retain(|(s, i, _), _| !(s == &symbol && *i == interval));
        before - self.data.len()
    }

    /// Clear all entries from the cache.
    pub fn invalidate_all(&self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
