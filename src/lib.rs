//! Augur - signal fusion service for candle series.
//!
//! Technical indicators, a forecast ensemble and support/resistance levels
//! are combined into one confidence-scored BUY/SELL/HOLD signal.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod types;

use axum::Router;
use config::Config;
use services::{CandleStore, SignalStore};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub candle_store: Arc<CandleStore>,
    pub signal_store: Arc<SignalStore>,
}

impl AppState {
    /// Build the stores from configuration.
    pub fn new(config: &Config) -> Self {
        let candle_store = CandleStore::new(config.candle_capacity);
        let signal_store = SignalStore::new(
            candle_store.clone(),
            config.analysis.clone(),
            config.default_lookback,
            config.history_size,
        );
        Self {
            candle_store,
            signal_store,
        }
    }
}

/// Full application router with CORS and request tracing.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Re-export commonly used types
pub use types::*;
