use std::{sync::Arc, time::Duration};

mod app;
mod auth;
mod config;
mod error;
mod mail;
mod state;
#[cfg(test)]
mod testing;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "rsu_auth=debug,axum=info,tower_http=info".to_string());
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

    tracing::info!("rsu startup");

    let config = match AppConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return Err(e);
        }
    };
    let addr = config.bind_addr()?;

    let (state, mail_workers) = AppState::init(config).await?;
    app::serve(app::build_app(state), addr).await?;

    mail_workers.shutdown(Duration::from_secs(10)).await;
    tracing::info!("rsu shutdown");
    Ok(())
}
