use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Candle interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CandleInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    #[default]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
}

impl CandleInterval {
    /// Get the interval from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1m" => Some(Self::OneMinute),
            "5m" => Some(Self::FiveMinutes),
            "15m" => Some(Self::FifteenMinutes),
            "1h" => Some(Self::OneHour),
            "4h" => Some(Self::FourHours),
            "1d" => Some(Self::OneDay),
            _ => None,
        }
    }

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::OneHour => "1h",
            Self::FourHours => "4h",
            Self::OneDay => "1d",
        }
    }

    /// Interval length in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        match self {
            Self::OneMinute => 60_000,
            Self::FiveMinutes => 300_000,
            Self::FifteenMinutes => 900_000,
            Self::OneHour => 3_600_000,
            Self::FourHours => 14_400_000,
            Self::OneDay => 86_400_000,
        }
    }
}

impl std::fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One OHLCV candle. `timestamp` is the UTC open time in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Candle whose open, high, low and close are all `price`.
    pub fn flat(timestamp: i64, price: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
        }
    }
}

/// Identity of the exact candles a result was computed from.
///
/// Two series share a stamp only if they end at the same candle, have the
/// same length and hash to the same contents, so replacing any candle in
/// place (an updated in-progress candle, a corrected print) changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeriesStamp {
    pub last_timestamp: i64,
    pub len: usize,
    pub fingerprint: u64,
}

impl SeriesStamp {
    /// Stamp of a series, or None when it is empty.
    pub fn of(candles: &[Candle]) -> Option<Self> {
        let last = candles.last()?;
        let mut hasher = DefaultHasher::new();
        for candle in candles {
            candle.timestamp.hash(&mut hasher);
            for value in [candle.open, candle.high, candle.low, candle.close, candle.volume] {
                value.to_bits().hash(&mut hasher);
            }
        }
        Some(Self {
            last_timestamp: last.timestamp,
            len: candles.len(),
            fingerprint: hasher.finish(),
        })
    }
}

/// Closing prices of a series, oldest first.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}
