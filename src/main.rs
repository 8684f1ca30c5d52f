mod app;
mod auth;
mod config;
mod error;
mod keepalive;
mod locations;
mod state;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "geotrack=debug,axum=info,tower_http=info".to_string());
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
    tracing::info!(environment = ?config.environment, "configuration loaded");
    let (host, port) = (config.host.clone(), config.port);
    let self_ping = config.self_ping.clone();

    let app_state = AppState::init(config).await?;
    tracing::info!("database connected");

    let app = app::build_app(app_state);
    let _ping = keepalive::spawn_self_ping(&self_ping);

    app::serve(app, &host, port).await
}
