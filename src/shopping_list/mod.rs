//! Shopping list export
//!
//! Cart lines are fetched with one join, aggregated per ingredient, then
//! rendered to PDF for delivery over HTTP or to a file.

pub mod aggregate;
pub mod render;

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

pub use aggregate::{aggregate, ShoppingItem};
pub use render::{format_line, layout, render_pdf, PageLayout, CLOSING_MESSAGE};

use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::CartLine;
use crate::services::RequestUser;

/// Attachment name used when the document is downloaded
pub const FILENAME: &str = "shopping_list.pdf";

/// Result of writing the document to disk
#[derive(Debug, Serialize)]
pub struct ExportSummary {
    pub file_path: String,
    pub items: usize,
    pub bytes: usize,
    pub generated_at: String,
}

/// Aggregated ingredients across every recipe in the user's cart
pub fn for_user(db: &Database, user: RequestUser) -> AppResult<Vec<ShoppingItem>> {
    let conn = db.get_conn()?;
    let lines = CartLine::for_user(&conn, user.id)?;
    Ok(aggregate(lines))
}

/// Render the user's list; an empty cart still yields a valid document
pub fn export_pdf(db: &Database, user: RequestUser, title: &str) -> AppResult<Vec<u8>> {
    let items = for_user(db, user)?;
    let bytes = render_pdf(title, &items)
        .map_err(|e| AppError::internal(format!("failed to render shopping list: {}", e)))?;
    info!(user_id = user.id, items = items.len(), bytes = bytes.len(), "rendered shopping list");
    Ok(bytes)
}

/// Render the user's list and write it to `output_path`
pub fn export_to_file(
    db: &Database,
    user: RequestUser,
    title: &str,
    output_path: &str,
) -> AppResult<ExportSummary> {
    let items = for_user(db, user)?;
    let bytes = render_pdf(title, &items)
        .map_err(|e| AppError::internal(format!("failed to render shopping list: {}", e)))?;

    let path = Path::new(output_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::invalid_input(format!("cannot create '{}': {}", parent.display(), e))
        })?;
    }
    fs::write(path, &bytes).map_err(|e| {
        AppError::invalid_input(format!("cannot write '{}': {}", output_path, e))
    })?;

    info!(user_id = user.id, path = output_path, "wrote shopping list");
    Ok(ExportSummary {
        file_path: output_path.to_string(),
        items: items.len(),
        bytes: bytes.len(),
        generated_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    })
}
