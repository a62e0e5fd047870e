//! Rankings server binary.
//!
//! Opens the database, loads configuration from the environment, and runs
//! the axum web server until Ctrl+C.

use tracing_subscriber::EnvFilter;

use movie_rankings::app::SharedState;
use movie_rankings::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Movie Rankings server");

    let (db, config) = movie_rankings::init_foundation()?;
    let state = SharedState::new(db, config);

    let server_state = state.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server::start_server(server_state).await {
            tracing::error!("Server failed: {e}");
        }
    });

    tracing::info!(
        port = state.server_port(),
        "Server running. Press Ctrl+C to stop."
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    server_handle.abort();
    Ok(())
}
