use std::env;
use std::str::FromStr;
use tracing::warn;

/// Parse an environment variable, falling back to `default` when unset or invalid.
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Indicator window sizes and vote thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub sma_period: usize,
    pub stochastic_k: usize,
    pub stochastic_d: usize,
    pub stochastic_overbought: f64,
    pub stochastic_oversold: f64,
    pub williams_period: usize,
    pub williams_overbought: f64,
    pub williams_oversold: f64,
    pub atr_period: usize,
    /// Latest true range / ATR ratio that counts as a volatility breakout.
    pub atr_expansion: f64,
    pub volume_period: usize,
    /// Latest volume / average volume ratio that counts as a spike.
    pub volume_spike: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_std_dev: 2.0,
            ema_fast: 12,
            ema_slow: 26,
            sma_period: 50,
            stochastic_k: 14,
            stochastic_d: 3,
            stochastic_overbought: 80.0,
            stochastic_oversold: 20.0,
            williams_period: 14,
            williams_overbought: -20.0,
            williams_oversold: -80.0,
            atr_period: 14,
            atr_expansion: 1.5,
            volume_period: 20,
            volume_spike: 2.0,
        }
    }
}

impl IndicatorConfig {
    fn from_env() -> Self {
        let d = Self::default();
        Self {
            rsi_period: env_parse("RSI_PERIOD", d.rsi_period),
            rsi_overbought: env_parse("RSI_OVERBOUGHT", d.rsi_overbought),
            rsi_oversold: env_parse("RSI_OVERSOLD", d.rsi_oversold),
            macd_fast: env_parse("MACD_FAST", d.macd_fast),
            macd_slow: env_parse("MACD_SLOW", d.macd_slow),
            macd_signal: env_parse("MACD_SIGNAL", d.macd_signal),
            bollinger_period: env_parse("BOLLINGER_PERIOD", d.bollinger_period),
            bollinger_std_dev: env_parse("BOLLINGER_STD_DEV", d.bollinger_std_dev),
            ema_fast: env_parse("EMA_FAST", d.ema_fast),
            ema_slow: env_parse("EMA_SLOW", d.ema_slow),
            sma_period: env_parse("SMA_PERIOD", d.sma_period),
            stochastic_k: env_parse("STOCHASTIC_K", d.stochastic_k),
            stochastic_d: env_parse("STOCHASTIC_D", d.stochastic_d),
            stochastic_overbought: env_parse("STOCHASTIC_OVERBOUGHT", d.stochastic_overbought),
            stochastic_oversold: env_parse("STOCHASTIC_OVERSOLD", d.stochastic_oversold),
            williams_period: env_parse("WILLIAMS_PERIOD", d.williams_period),
            williams_overbought: env_parse("WILLIAMS_OVERBOUGHT", d.williams_overbought),
            williams_oversold: env_parse("WILLIAMS_OVERSOLD", d.williams_oversold),
            atr_period: env_parse("ATR_PERIOD", d.atr_period),
            atr_expansion: env_parse("ATR_EXPANSION", d.atr_expansion),
            volume_period: env_parse("VOLUME_PERIOD", d.volume_period),
            volume_spike: env_parse("VOLUME_SPIKE", d.volume_spike),
        }
    }
}

/// Support/resistance detection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelConfig {
    /// Number of trailing candles to scan (None = whole series).
    pub lookback: Option<usize>,
    /// Neighbourhood radius for swing highs/lows.
    pub radius: usize,
    /// Relative clustering tolerance (0.005 = 0.5%).
    pub tolerance: f64,
    pub max_levels: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            lookback: None,
            radius: 2,
            tolerance: 0.005,
            max_levels: 10,
        }
    }
}

/// Forecast ensemble settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    /// Number of future steps.
    pub horizon: usize,
    /// Per-forecaster timeout.
    pub model_timeout_ms: u64,
    /// Timeout for indicator and level tasks.
    pub component_timeout_ms: u64,
    pub arima_order: usize,
    pub arima_min_history: usize,
    pub arima_trust: f64,
    pub season_length: usize,
    pub decomposition_min_history: usize,
    pub decomposition_trust: f64,
    pub sequence_lookback: usize,
    pub sequence_hidden: usize,
    pub sequence_epochs: usize,
    pub sequence_learning_rate: f64,
    pub sequence_seed: u64,
    pub sequence_trust: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 24,
            model_timeout_ms: 2_000,
            component_timeout_ms: 5_000,
            arima_order: 2,
            arima_min_history: 30,
            arima_trust: 0.25,
            season_length: 24,
            decomposition_min_history: 20,
            decomposition_trust: 0.40,
            sequence_lookback: 20,
            sequence_hidden: 8,
            sequence_epochs: 60,
            sequence_learning_rate: 0.05,
            sequence_seed: 7,
            sequence_trust: 0.35,
        }
    }
}

/// Weights and thresholds for combining the sub-scores.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionConfig {
    pub technical_weight: f64,
    pub forecast_weight: f64,
    pub buy_threshold: u8,
    pub sell_threshold: u8,
    /// Relative distance within which a level affects the composite.
    pub proximity_tolerance: f64,
    /// Largest adjustment a single level can apply.
    pub proximity_max_penalty: f64,
    /// Level strength at which the full adjustment applies.
    pub strength_saturation: u32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            technical_weight: 0.5,
            forecast_weight: 0.5,
            buy_threshold: 65,
            sell_threshold: 35,
            proximity_tolerance: 0.01,
            proximity_max_penalty: 0.8,
            strength_saturation: 5,
        }
    }
}

/// Stop-loss/target derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    /// Distance placed beyond the protecting level (0.002 = 0.2%).
    pub stop_buffer: f64,
    pub fallback_stop_pct: f64,
    pub fallback_target_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            stop_buffer: 0.002,
            fallback_stop_pct: 0.02,
            fallback_target_pct: 0.04,
        }
    }
}

/// Everything the analysis core consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Largest allowed gap between candles, in intervals.
    pub gap_tolerance: f64,
    pub indicators: IndicatorConfig,
    pub levels: LevelConfig,
    pub forecast: ForecastConfig,
    pub fusion: FusionConfig,
    pub risk: RiskConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            gap_tolerance: 1.5,
            indicators: IndicatorConfig::default(),
            levels: LevelConfig::default(),
            forecast: ForecastConfig::default(),
            fusion: FusionConfig::default(),
            risk: RiskConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Validated defaults.
    pub fn standard() -> Self {
        Self::default().validated()
    }

    /// Load from environment variables.
    pub fn from_env() -> Self {
        let levels = LevelConfig::default();
        let forecast = ForecastConfig::default();
        let fusion = FusionConfig::default();
        let risk = RiskConfig::default();

        Self {
            gap_tolerance: env_parse("GAP_TOLERANCE", 1.5),
            indicators: IndicatorConfig::from_env(),
            levels: LevelConfig {
                lookback: Some(env_parse::<usize>("LEVELS_LOOKBACK", 0)).filter(|&n| n > 0),
                radius: env_parse("LEVELS_RADIUS", levels.radius),
                tolerance: env_parse("LEVELS_TOLERANCE", levels.tolerance),
                max_levels: env_parse("LEVELS_MAX", levels.max_levels),
            },
            forecast: ForecastConfig {
                horizon: env_parse("FORECAST_HORIZON", forecast.horizon),
                model_timeout_ms: env_parse("FORECAST_MODEL_TIMEOUT_MS", forecast.model_timeout_ms),
                component_timeout_ms: env_parse(
                    "ANALYSIS_COMPONENT_TIMEOUT_MS",
                    forecast.component_timeout_ms,
                ),
                arima_order: env_parse("ARIMA_ORDER", forecast.arima_order),
                arima_min_history: env_parse("ARIMA_MIN_HISTORY", forecast.arima_min_history),
                arima_trust: env_parse("ARIMA_TRUST", forecast.arima_trust),
                season_length: env_parse("SEASON_LENGTH", forecast.season_length),
                decomposition_min_history: env_parse(
                    "DECOMPOSITION_MIN_HISTORY",
                    forecast.decomposition_min_history,
                ),
                decomposition_trust: env_parse("DECOMPOSITION_TRUST", forecast.decomposition_trust),
                sequence_lookback: env_parse("SEQUENCE_LOOKBACK", forecast.sequence_lookback),
                sequence_hidden: env_parse("SEQUENCE_HIDDEN", forecast.sequence_hidden),
                sequence_epochs: env_parse("SEQUENCE_EPOCHS", forecast.sequence_epochs),
                sequence_learning_rate: env_parse(
                    "SEQUENCE_LEARNING_RATE",
                    forecast.sequence_learning_rate,
                ),
                sequence_seed: env_parse("SEQUENCE_SEED", forecast.sequence_seed),
                sequence_trust: env_parse("SEQUENCE_TRUST", forecast.sequence_trust),
            },
            fusion: FusionConfig {
                technical_weight: env_parse("TECHNICAL_WEIGHT", fusion.technical_weight),
                forecast_weight: env_parse("FORECAST_WEIGHT", fusion.forecast_weight),
                buy_threshold: env_parse("BUY_THRESHOLD", fusion.buy_threshold),
                sell_threshold: env_parse("SELL_THRESHOLD", fusion.sell_threshold),
                proximity_tolerance: env_parse("PROXIMITY_TOLERANCE", fusion.proximity_tolerance),
                proximity_max_penalty: env_parse("PROXIMITY_MAX_PENALTY", fusion.proximity_max_penalty),
                strength_saturation: env_parse("STRENGTH_SATURATION", fusion.strength_saturation),
            },
            risk: RiskConfig {
                stop_buffer: env_parse("RISK_STOP_BUFFER", risk.stop_buffer),
                fallback_stop_pct: env_parse("RISK_FALLBACK_STOP_PCT", risk.fallback_stop_pct),
                fallback_target_pct: env_parse("RISK_FALLBACK_TARGET_PCT", risk.fallback_target_pct),
            },
        }
        .validated()
    }

    /// Replace invalid combinations with defaults and renormalize the fusion weights.
    pub fn validated(mut self) -> Self {
        if !(self.gap_tolerance >= 1.0) {
            warn!("Gap tolerance {} is below one interval, using 1.5", self.gap_tolerance);
            self.gap_tolerance = 1.5;
        }

        let fusion = &mut self.fusion;
        let weights_valid = fusion.technical_weight >= 0.0
            && fusion.forecast_weight >= 0.0
            && fusion.technical_weight + fusion.forecast_weight > 0.0;
        if weights_valid {
            let total = fusion.technical_weight + fusion.forecast_weight;
            fusion.technical_weight /= total;
            fusion.forecast_weight /= total;
        } else {
            warn!(
                "Invalid fusion weights {}/{}, using 0.5/0.5",
                fusion.technical_weight, fusion.forecast_weight
            );
            fusion.technical_weight = 0.5;
            fusion.forecast_weight = 0.5;
        }

        if fusion.sell_threshold >= fusion.buy_threshold || fusion.buy_threshold > 100 {
            warn!(
                "Invalid thresholds sell={} buy={}, using 35/65",
                fusion.sell_threshold, fusion.buy_threshold
            );
            fusion.buy_threshold = 65;
            fusion.sell_threshold = 35;
        }

        if self.forecast.horizon == 0 {
            warn!("Forecast horizon must be positive, using 24");
            self.forecast.horizon = 24;
        }
        if self.levels.radius == 0 {
            warn!("Level radius must be positive, using 2");
            self.levels.radius = 2;
        }

        // Stops and targets must stay on their own side of the price
        let defaults = RiskConfig::default();
        let risk = &mut self.risk;
        if !(0.0..1.0).contains(&risk.stop_buffer) {
            warn!("Invalid stop buffer {}, using {}", risk.stop_buffer, defaults.stop_buffer);
            risk.stop_buffer = defaults.stop_buffer;
        }
        if !(risk.fallback_stop_pct > 0.0 && risk.fallback_stop_pct < 1.0) {
            warn!(
                "Invalid fallback stop {}, using {}",
                risk.fallback_stop_pct, defaults.fallback_stop_pct
            );
            risk.fallback_stop_pct = defaults.fallback_stop_pct;
        }
        if !(risk.fallback_target_pct > 0.0 && risk.fallback_target_pct < 1.0) {
            warn!(
                "Invalid fallback target {}, using {}",
                risk.fallback_target_pct, defaults.fallback_target_pct
            );
            risk.fallback_target_pct = defaults.fallback_target_pct;
        }

        self
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Maximum candles kept per symbol/interval.
    pub candle_capacity: usize,
    /// Candles requested from the feed per analysis.
    pub default_lookback: usize,
    /// Signals kept per symbol/interval.
    pub history_size: usize,
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT", 3001),
            candle_capacity: env_parse("CANDLE_CAPACITY", 5_000),
            default_lookback: env_parse("DEFAULT_LOOKBACK", 500),
            history_size: env_parse("SIGNAL_HISTORY_SIZE", 100),
            analysis: AnalysisConfig::from_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            candle_capacity: 5_000,
            default_lookback: 500,
            history_size: 100,
            analysis: AnalysisConfig::standard(),
        }
    }
}
