//! Fleet tracker service binary

use std::future::IntoFuture;
use std::sync::Arc;

use tokio::signal;
use tracing::info;

use fleet_tracker::api::{self, AppState};
use fleet_tracker::config::AppConfig;
use fleet_tracker::database::Database;
use fleet_tracker::errors::FleetTrackerError;

#[tokio::main]
async fn main() -> Result<(), FleetTrackerError> {
    // Initialize logging with more configuration
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration, preferring environment variables and config files
    let config = AppConfig::load()?;
    config.http.validate()?;

    let db = Arc::new(Database::from_config(&config.database).await?);
    let state = AppState::new(db.clone(), db);
    let app = api::router(state, config.http.request_timeout);

    let listener = tokio::net::TcpListener::bind(config.http.bind.as_str()).await?;
    info!("Listening on {}", config.http.bind);

    // Setup signal handling for graceful shutdown
    let shutdown_signal = signal::ctrl_c();

    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            info!("Server stopped: {:?}", result);
        }
        _ = shutdown_signal => {
            info!("Received shutdown signal");
        }
    }

    Ok(())
}
