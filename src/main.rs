use augur::config::Config;
use augur::{app, AppState};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "augur=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!("Starting Augur server on {}:{}", config.host, config.port);
    info!(
        "Forecast horizon {} steps, thresholds sell<={} buy>={}",
        config.analysis.forecast.horizon,
        config.analysis.fusion.sell_threshold,
        config.analysis.fusion.buy_threshold
    );

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(&config);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Augur server listening on {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
