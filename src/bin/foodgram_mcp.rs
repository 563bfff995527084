//! Foodgram MCP server
//!
//! Serves the MCP tools over stdio on behalf of the user named by
//! `FOODGRAM_MCP_USER` (username or email).

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use foodgram::build_info;
use foodgram::config::Config;
use foodgram::db::Database;
use foodgram::mcp::FoodgramService;
use foodgram::services::users;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("foodgram=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner("MCP");
    eprintln!("Starting MCP server on stdio...");

    let config = Config::from_env()?;
    config.trace_loaded();
    eprintln!("Database path: {}", config.database_path.display());

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = Database::open(&config.database_path)?;

    let login = std::env::var("FOODGRAM_MCP_USER")
        .map_err(|_| "FOODGRAM_MCP_USER must name the user the MCP server acts for")?;
    let user = users::resolve_login(&database, &login)?;
    eprintln!("Acting as user {} ({})", login, user.id);

    let service = FoodgramService::new(database, config, user);

    // Create stdio transport
    let transport = (stdin(), stdout());

    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
