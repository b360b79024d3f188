//! Candle feed endpoints.

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use super::{parse_interval, ApiResponse};
use crate::error::{AppError, Result};
use crate::services::candle_store::SeriesInfo;
use crate::types::Candle;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResponse {
    pub symbol: String,
    pub interval: String,
    pub received: usize,
    pub stored: usize,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/symbols", get(list_series))
        .route("/:symbol/:interval", put(merge_candles))
}

/// Merge candles into the in-memory feed.
async fn merge_candles(
    State(state): State<AppState>,
    Path((symbol, interval)): Path<(String, String)>,
    Json(candles): Json<Vec<Candle>>,
) -> Result<Json<ApiResponse<MergeResponse>>> {
    let interval = parse_interval(Some(&interval))?;
    if candles.is_empty() {
        return Err(AppError::BadRequest("no candles in request".to_string()));
    }

    let received = candles.len();
    let stored = state.candle_store.merge(&symbol, interval, candles);
    info!("Stored {} candles for {} {}", stored, symbol, interval);

    Ok(Json(ApiResponse::new(MergeResponse {
        symbol: symbol.to_lowercase(),
        interval: interval.to_string(),
        received,
        stored,
    })))
}

async fn list_series(State(state): State<AppState>) -> Json<ApiResponse<Vec<SeriesInfo>>> {
    Json(ApiResponse::new(state.candle_store.series()))
}
