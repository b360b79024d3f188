//! Technical indicator implementations.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod volume;
pub mod williams_r;

pub use atr::Atr;
pub use bollinger::BollingerBands;
pub use ema::EmaCross;
pub use macd::Macd;
pub use rsi::Rsi;
pub use sma::SmaCross;
pub use stochastic::Stochastic;
pub use volume::VolumeRatio;
pub use williams_r::WilliamsR;

use super::Indicator;
use crate::config::IndicatorConfig;

/// Build every indicator from configuration, in reporting order.
pub fn all_indicators(config: &IndicatorConfig) -> Vec<Box<dyn Indicator>> {
    vec![
        Box::new(Rsi::new(
            config.rsi_period,
            config.rsi_overbought,
            config.rsi_oversold,
        )),
        Box::new(Macd::new(
            config.macd_fast,
            config.macd_slow,
            config.macd_signal,
        )),
        Box::new(BollingerBands::new(
            config.bollinger_period,
            config.bollinger_std_dev,
        )),
        Box::new(EmaCross::new(config.ema_fast, config.ema_slow)),
        Box::new(SmaCross::new(config.sma_period)),
        Box::new(Stochastic::new(
            config.stochastic_k,
            config.stochastic_d,
            config.stochastic_overbought,
            config.stochastic_oversold,
        )),
        Box::new(WilliamsR::new(
            config.williams_period,
            config.williams_overbought,
            config.williams_oversold,
        )),
        Box::new(Atr::new(config.atr_period, config.atr_expansion)),
        Box::new(VolumeRatio::new(config.volume_period, config.volume_spike)),
    ]
}
