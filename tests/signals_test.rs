//! End-to-end signal generation tests against the library crate.

use augur::config::AnalysisConfig;
use augur::error::AnalysisError;
use augur::services::forecast::ensemble::combine;
use augur::services::forecast::FitCache;
use augur::services::signals::indicators::Rsi;
use augur::services::signals::{make_reading, SignalGenerator};
use augur::types::{
    Candle, CandleInterval, Decision, EnsembleForecast, ForecastPoint, ForecastResult,
    IndicatorCategory, IndicatorReading, IndicatorSnapshot, LevelKind, ModelKind, Signal,
    SupportResistanceLevel, Vote,
};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

const HOUR_MS: i64 = 3_600_000;

fn hourly(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                timestamp: i as i64 * HOUR_MS,
                open,
                high: open.max(close) + 0.5,
                low: open.min(close) - 0.5,
                close,
                volume: 1_000.0,
            }
        })
        .collect()
}

fn generator() -> SignalGenerator {
    SignalGenerator::new(AnalysisConfig::standard(), Arc::new(FitCache::new()))
}

/// Nine indicators in reporting order with only RSI and MACD voting.
fn rsi_and_macd_bullish() -> IndicatorSnapshot {
    let mut readings = vec![
        make_reading("RSI14", IndicatorCategory::Momentum, &[("RSI14", 24.0)], Vote::Bullish),
        make_reading(
            "MACD",
            IndicatorCategory::Trend,
            &[("MACD", -0.2), ("MACD_signal", -0.3), ("MACD_hist", 0.1)],
            Vote::Bullish,
        ),
    ];
    for (name, category) in [
        ("BB20", IndicatorCategory::Volatility),
        ("EMA12_26", IndicatorCategory::Trend),
        ("SMA50", IndicatorCategory::Trend),
        ("STOCH14", IndicatorCategory::Momentum),
        ("WILLR14", IndicatorCategory::Momentum),
        ("ATR14", IndicatorCategory::Volatility),
        ("VOL20", IndicatorCategory::Volume),
    ] {
        readings.push(IndicatorReading::unavailable(name, category));
    }
    IndicatorSnapshot::new(readings)
}

/// Single-model forecast ending at `final_price` with a constant band `width`.
fn forecast_to(final_price: f64, width: f64, current: f64) -> EnsembleForecast {
    let steps = 24;
    let points = (1..=steps)
        .map(|h| {
            let price = current + (final_price - current) * h as f64 / steps as f64;
            ForecastPoint {
                timestamp: h as i64 * HOUR_MS,
                predicted_price: price,
                lower_bound: price - width / 2.0,
                upper_bound: price + width / 2.0,
            }
        })
        .collect();
    let result = ForecastResult {
        model: "decomposition".to_string(),
        kind: ModelKind::Decomposition,
        points,
        trust_weight: 0.4,
    };
    combine(&[result], Vec::new(), current).unwrap()
}

// =============================================================================
// RSI Bounds
// =============================================================================

#[test]
fn test_rsi_extremes() {
    let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let falling: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
    assert_eq!(Rsi::calculate_rsi(&hourly(&rising), 14), Some(100.0));
    assert_eq!(Rsi::calculate_rsi(&hourly(&falling), 14), Some(0.0));

    let mixed: Vec<f64> = (0..60)
        .map(|i| 100.0 + 5.0 * (i as f64 * 0.9).sin())
        .collect();
    let rsi = Rsi::calculate_rsi(&hourly(&mixed), 14).unwrap();
    assert!((0.0..=100.0).contains(&rsi));
}

// =============================================================================
// Fusion Scenarios
// =============================================================================

#[test]
fn test_oversold_cross_with_rising_forecast_is_strong_buy() {
    let generator = generator();
    let forecast = forecast_to(105.0, 5.0, 100.0);
    assert!((forecast.trend_strength - 0.5).abs() < 1e-9);

    let last = Candle::flat(10 * HOUR_MS, 100.0, 1_000.0);
    let signal = generator.fuse(
        "BTC",
        CandleInterval::OneHour,
        &last,
        &rsi_and_macd_bullish(),
        Some(&forecast),
        &[],
        Vec::new(),
    );

    assert_eq!(signal.decision, Decision::Buy);
    assert!(signal.confidence >= 80, "confidence {}", signal.confidence);
    assert!(signal.suggested_stop_loss.unwrap() < signal.price_at_signal);
    assert_eq!(signal.candle_timestamp, 10 * HOUR_MS);

    let names: Vec<&str> = signal
        .contributing_votes
        .iter()
        .map(|v| v.name.as_str())
        .collect();
    assert_eq!(names.len(), 12);
    assert_eq!(&names[9..], &["technical", "forecast", "proximity"]);
}

#[test]
fn test_strong_resistance_at_price_blocks_buy() {
    let generator = generator();
    let forecast = forecast_to(110.0, 2.0, 100.0);
    let levels = vec![SupportResistanceLevel {
        price: 100.0,
        strength: 5,
        kind: LevelKind::Resistance,
        distance: 0.0,
    }];

    let last = Candle::flat(0, 100.0, 1_000.0);
    let signal = generator.fuse(
        "BTC",
        CandleInterval::OneHour,
        &last,
        &rsi_and_macd_bullish(),
        Some(&forecast),
        &levels,
        Vec::new(),
    );

    assert!(signal.confidence < 65, "confidence {}", signal.confidence);
    assert_eq!(signal.decision, Decision::Hold);
}

#[test]
fn test_signal_json_round_trip() {
    let generator = generator();
    let last = Candle::flat(0, 250.0, 1_000.0);
    let signal = generator.fuse(
        "ETH",
        CandleInterval::FourHours,
        &last,
        &rsi_and_macd_bullish(),
        Some(&forecast_to(262.5, 12.5, 250.0)),
        &[],
        Vec::new(),
    );

    let json = serde_json::to_string(&signal).unwrap();
    assert!(json.contains("\"decision\":\"buy\""));
    assert!(json.contains("\"interval\":\"4h\""));

    let parsed: Signal = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.id, signal.id);
    assert_eq!(parsed.contributing_votes.len(), signal.contributing_votes.len());
}

#[test]
fn test_signal_json_round_trip_keeps_prices_exact() {
    let generator = generator();
    let bullish = rsi_and_macd_bullish();

    for i in 0..2_000 {
        let price = 100.0 + i as f64 * 0.123456789;
        let forecast = forecast_to(price * 1.05, price * 0.05, price);
        let last = Candle::flat(i * HOUR_MS, price, 1_000.0);
        let signal = generator.fuse(
            "BTC",
            CandleInterval::OneHour,
            &last,
            &bullish,
            Some(&forecast),
            &[],
            Vec::new(),
        );
        assert_eq!(signal.decision, Decision::Buy);

        let json = serde_json::to_string(&signal).unwrap();
        let parsed: Signal = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.decision, signal.decision, "price {}", price);
        assert_eq!(parsed.confidence, signal.confidence, "price {}", price);
        assert_eq!(parsed.price_at_signal, signal.price_at_signal, "price {}", price);
        assert_eq!(parsed.suggested_stop_loss, signal.suggested_stop_loss, "price {}", price);
        assert_eq!(parsed.suggested_target, signal.suggested_target, "price {}", price);
        assert_eq!(parsed.risk_reward, signal.risk_reward, "price {}", price);
    }
}

// =============================================================================
// Full Analysis
// =============================================================================

#[tokio::test]
async fn test_flat_series_is_neutral() {
    let candles: Vec<Candle> = (0..30)
        .map(|i| Candle::flat(i * HOUR_MS, 100.0, 1_000.0))
        .collect();
    let report = assert_ok!(generator().analyze("BTC", CandleInterval::OneHour, candles).await);

    assert_eq!(report.signal.decision, Decision::Hold);
    assert_eq!(report.signal.confidence, 50);
    assert!(report.signal.composite.abs() < 1e-9);
    for reading in &report.indicators.readings {
        assert!(
            matches!(reading.vote, Vote::Neutral | Vote::Unavailable),
            "{} voted {:?}",
            reading.name,
            reading.vote
        );
    }
    if let Some(forecast) = &report.forecast {
        assert!(forecast.trend_strength.abs() < 1e-9);
    }
}

#[tokio::test]
async fn test_all_forecasters_failing_still_signals() {
    let closes: Vec<f64> = (0..18).map(|i| 200.0 - 2.0 * i as f64).collect();
    let report = assert_ok!(
        generator()
            .analyze("SOL", CandleInterval::OneHour, hourly(&closes))
            .await
    );

    assert!(report.forecast.is_none());
    assert!(report.indicators.available_count() > 0);
    assert!(report
        .signal
        .rationale
        .iter()
        .any(|note| note.starts_with("no forecast available")));
    // Falling closes: RSI at 0 reads oversold, the rest lean bearish or neutral
    assert!(report.signal.confidence <= 100);
    let technical = report
        .signal
        .contributing_votes
        .iter()
        .find(|v| v.name == "technical")
        .unwrap();
    assert_eq!(technical.weight, 1.0);
}

#[tokio::test]
async fn test_gap_in_series_is_data_gap() {
    let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
    let mut candles = hourly(&closes);
    for candle in candles.iter_mut().skip(20) {
        candle.timestamp += 3 * HOUR_MS;
    }

    let err = assert_err!(
        generator()
            .analyze("BTC", CandleInterval::OneHour, candles)
            .await
    );
    assert_eq!(
        err,
        AnalysisError::DataGap {
            timestamp: 23 * HOUR_MS,
            gap_ms: 4 * HOUR_MS,
            allowed_ms: 5_400_000,
        }
    );
}

#[tokio::test]
async fn test_confidence_and_decision_agree() {
    let config = AnalysisConfig::standard();
    let generator = generator();
    for seed in 0..4 {
        let closes: Vec<f64> = (0..90)
            .map(|i| {
                let t = i as f64;
                100.0 + (seed as f64 - 1.5) * 0.3 * t + 3.0 * (t * (0.2 + seed as f64 * 0.1)).sin()
            })
            .collect();
        let report = assert_ok!(
            generator
                .analyze("BTC", CandleInterval::OneHour, hourly(&closes))
                .await
        );
        let signal = &report.signal;
        assert!(signal.confidence <= 100);
        assert!((-1.0..=1.0).contains(&signal.composite));
        let expected = if signal.confidence >= config.fusion.buy_threshold {
            Decision::Buy
        } else if signal.confidence <= config.fusion.sell_threshold {
            Decision::Sell
        } else {
            Decision::Hold
        };
        assert_eq!(signal.decision, expected);
        match signal.decision {
            Decision::Buy => assert!(signal.suggested_stop_loss.unwrap() < signal.price_at_signal),
            Decision::Sell => assert!(signal.suggested_stop_loss.unwrap() > signal.price_at_signal),
            Decision::Hold => assert!(signal.suggested_stop_loss.is_none()),
        }
        if let Some(forecast) = &report.forecast {
            assert!((forecast.weight_sum() - 1.0).abs() < 1e-9);
        }
    }
}
