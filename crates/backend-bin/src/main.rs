// crates/backend-bin/src/main.rs
use backend_lib::{config::Settings, routes, store::FlatFileStorage, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::{interval, Duration};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize configuration first so it can drive the log filter
    let config = Settings::load().or_else(|_| {
        tracing::warn!("falling back to ./config/default.toml");
        Settings::load_from("./config/default.toml")
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    // Create storage
    let storage = FlatFileStorage::new(&config.data_dir)?;

    // Create application state
    let bind_addr = config.bind_addr;
    let sweep_interval = config.session.sweep_interval_secs;
    let state = Arc::new(AppState::new(storage, config));

    // Background task: sweep expired session carriers
    let state_clone = state.clone();
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(sweep_interval));
        loop {
            interval.tick().await;
            let removed = state_clone.carriers.sweep();
            if removed > 0 {
                tracing::info!(removed, "swept expired sessions");
            }
        }
    });

    // Background task: drop expired login lockouts
    let login_limiter = state.login_limiter.clone();
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(60 * 60));
        loop {
            interval.tick().await;
            login_limiter.cleanup();
        }
    });

    // Create the router
    let app = routes::create_router(state);

    // Start the server
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
