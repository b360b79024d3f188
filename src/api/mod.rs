pub mod candles;
pub mod health;
pub mod signals;

use crate::error::AppError;
use crate::types::CandleInterval;
use crate::AppState;
use axum::Router;
use serde::{Deserialize, Serialize};

/// API response wrapper.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub meta: ApiMeta,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiMeta {
    pub cached: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: ApiMeta { cached: false },
        }
    }

    pub fn cached(data: T, cached: bool) -> Self {
        Self {
            data,
            meta: ApiMeta { cached },
        }
    }
}

/// Parse an optional interval parameter, defaulting to 1h.
pub(crate) fn parse_interval(raw: Option<&str>) -> Result<CandleInterval, AppError> {
    match raw {
        None => Ok(CandleInterval::default()),
        Some(s) => CandleInterval::from_str(s)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown interval: {}", s))),
    }
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/signals", signals::router())
        .nest("/api/candles", candles::router())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval(None).unwrap(), CandleInterval::OneHour);
        assert_eq!(parse_interval(Some("4h")).unwrap(), CandleInterval::FourHours);
        assert!(matches!(
            parse_interval(Some("2h")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_api_response_serialization() {
        let json = serde_json::to_value(ApiResponse::cached(7, true)).unwrap();
        assert_eq!(json["data"], 7);
        assert_eq!(json["meta"]["cached"], true);
    }
}
