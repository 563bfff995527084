//! Foodgram
//!
//! HTTP API server.

use tracing::info;
use tracing_subscriber::EnvFilter;

use foodgram::build_info;
use foodgram::config::Config;
use foodgram::db::Database;
use foodgram::http::{self, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("foodgram=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner("HTTP API");

    let config = Config::from_env()?;
    config.trace_loaded();

    // Ensure data directory exists
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = Database::open(&config.database_path)?;
    info!("Database ready");

    let bind_addr = config.bind_addr;
    let app = http::router(AppState::new(database, config));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
