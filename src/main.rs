mod app;
mod auth;
mod config;
mod db;
mod enrichment;
mod envelope;
mod error;
#[cfg(test)]
mod memory;
mod state;
mod tasks;
mod validation;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "taskweather=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    error::hide_internal_errors(config.is_production());
    tracing::info!(
        environment = ?config.environment,
        city_detection = config.enrichment.gemini_api_key.is_some(),
        weather_lookup = config.enrichment.weather_api_key.is_some(),
        "configuration loaded"
    );

    let app_state = AppState::init(config).await?;
    let config = app_state.config.clone();
    let app = app::build_app(app_state);
    app::serve(app, &config).await
}
