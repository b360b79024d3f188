pub mod candle_store;
pub mod forecast;
pub mod signals;

pub use candle_store::{CandleFeed, CandleStore, SeriesInfo};
pub use forecast::{FitCache, ForecastEnsemble};
pub use signals::{SignalGenerator, SignalStore};
