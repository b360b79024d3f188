//! Signal API endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::{parse_interval, ApiResponse};
use crate::error::{AnalysisError, AppError, Result};
use crate::services::signals::store::Invalidated;
use crate::types::{AnalysisReport, Signal};
use crate::AppState;

/// Query parameters for the analysis endpoint.
#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    /// Candle interval: 1m, 5m, 15m, 1h, 4h, 1d
    pub interval: Option<String>,
    /// Number of trailing candles to analyse.
    pub lookback: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub interval: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct IntervalQuery {
    pub interval: Option<String>,
}

/// Create the signals router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:symbol", get(analyze))
        .route("/:symbol/history", get(get_history))
        .route("/:symbol/latest", get(get_latest))
        .route("/:symbol/invalidate", post(invalidate))
}

/// Analyse a symbol and return the full report.
async fn analyze(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<AnalyzeQuery>,
) -> Result<Json<ApiResponse<AnalysisReport>>> {
    let interval = parse_interval(query.interval.as_deref())?;
    if query.lookback == Some(0) {
        return Err(AppError::BadRequest("lookback must be positive".to_string()));
    }

    let (report, cached) = state
        .signal_store
        .analyze_tracked(&symbol, interval, query.lookback)
        .await
        .map_err(|e| match e {
            AnalysisError::EmptySeries => {
                AppError::NotFound(format!("No candles available for {} {}", symbol, interval))
            }
            other => AppError::from(other),
        })?;

    Ok(Json(ApiResponse::cached(report, cached)))
}

/// Recent signals, newest first.
async fn get_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<Signal>>>> {
    let interval = parse_interval(query.interval.as_deref())?;
    let limit = query.limit.unwrap_or(10);
    let signals = state.signal_store.history(&symbol, interval, limit);
    Ok(Json(ApiResponse::new(signals)))
}

async fn get_latest(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<IntervalQuery>,
) -> Result<Json<ApiResponse<Signal>>> {
    let interval = parse_interval(query.interval.as_deref())?;
    let signal = state
        .signal_store
        .latest(&symbol, interval)
        .ok_or_else(|| AppError::NotFound(format!("No signal yet for {} {}", symbol, interval)))?;
    Ok(Json(ApiResponse::new(signal)))
}

/// Drop cached reports and forecaster fits.
async fn invalidate(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<IntervalQuery>,
) -> Result<Json<ApiResponse<Invalidated>>> {
    let interval = parse_interval(query.interval.as_deref())?;
    let invalidated = state.signal_store.invalidate(&symbol, interval);
    Ok(Json(ApiResponse::new(invalidated)))
}
