use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Conditions that abort a whole analysis request.
///
/// Everything else (short history, failing forecasters) degrades the
/// affected sub-result instead and shows up in the signal rationale.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("no candles available")]
    EmptySeries,

    #[error("data gap of {gap_ms}ms before candle {timestamp} (allowed {allowed_ms}ms)")]
    DataGap {
        timestamp: i64,
        gap_ms: i64,
        allowed_ms: i64,
    },

    #[error("candle {timestamp} is not after the previous candle")]
    UnorderedSeries { timestamp: i64 },

    #[error("candle {timestamp} has a non-finite or non-positive price")]
    InvalidCandle { timestamp: i64 },

    #[error("value not representable: {0}")]
    Serialization(String),
}

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Analysis(AnalysisError::EmptySeries) => StatusCode::NOT_FOUND,
            AppError::Analysis(AnalysisError::Serialization(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Analysis(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::NotFound(msg) | AppError::BadRequest(msg) => msg.clone(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
