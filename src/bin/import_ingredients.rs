//! Bulk-load ingredients from a `name,measurement_unit` CSV file

use std::fs::File;
use std::io::BufReader;

use tracing_subscriber::EnvFilter;

use foodgram::config::Config;
use foodgram::db::Database;
use foodgram::services::ingredients;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("foodgram=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let csv_path = std::env::args()
        .nth(1)
        .ok_or("usage: import_ingredients <file.csv>")?;

    let config = Config::from_env()?;
    println!("Database path: {}", config.database_path.display());
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let database = Database::open(&config.database_path)?;

    let file = File::open(&csv_path)
        .map_err(|e| format!("Failed to open file '{}': {}", csv_path, e))?;
    let summary = ingredients::import_csv(&database, BufReader::new(file))?;

    println!("Rows read: {}", summary.total_rows);
    println!("  Inserted: {}", summary.inserted);
    println!("  Skipped (already present): {}", summary.skipped);
    for error in &summary.errors {
        println!("  {}", error);
    }

    Ok(())
}
