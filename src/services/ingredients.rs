//! Ingredient services
//!
//! CRUD over the ingredient reference data plus the CSV bulk import used by
//! the `import_ingredients` binary.

use std::io::BufRead;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::conflict_or_db;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Ingredient, IngredientCreate, IngredientUpdate};

const DUPLICATE_INGREDIENT: &str = "An ingredient with that name and measurement unit already exists";

/// Outcome of a CSV import
#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub total_rows: usize,
    pub inserted: usize,
    /// Rows already present in the database or repeated in the file
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// List ingredients, optionally those whose name starts with `name`
pub fn list_ingredients(db: &Database, name: Option<&str>) -> AppResult<Vec<Ingredient>> {
    let prefix = name.map(str::trim).filter(|s| !s.is_empty());
    let conn = db.get_conn()?;
    Ok(Ingredient::list(&conn, prefix)?)
}

pub fn get_ingredient(db: &Database, id: i64) -> AppResult<Ingredient> {
    let conn = db.get_conn()?;
    Ingredient::get_by_id(&conn, id)?
        .ok_or_else(|| AppError::not_found(format!("Ingredient {}", id)))
}

pub fn create_ingredient(db: &Database, mut data: IngredientCreate) -> AppResult<Ingredient> {
    data.validate().map_err(AppError::invalid_input)?;
    let conn = db.get_conn()?;
    let ingredient =
        Ingredient::create(&conn, &data).map_err(|e| conflict_or_db(e, DUPLICATE_INGREDIENT))?;
    debug!(ingredient_id = ingredient.id, name = %ingredient.name, "created ingredient");
    Ok(ingredient)
}

pub fn update_ingredient(
    db: &Database,
    id: i64,
    mut data: IngredientUpdate,
) -> AppResult<Ingredient> {
    data.validate().map_err(AppError::invalid_input)?;
    let conn = db.get_conn()?;
    Ingredient::update(&conn, id, &data)
        .map_err(|e| conflict_or_db(e, DUPLICATE_INGREDIENT))?
        .ok_or_else(|| AppError::not_found(format!("Ingredient {}", id)))
}

/// Fails while any recipe still uses the ingredient
pub fn delete_ingredient(db: &Database, id: i64) -> AppResult<()> {
    let conn = db.get_conn()?;
    if Ingredient::get_by_id(&conn, id)?.is_none() {
        return Err(AppError::not_found(format!("Ingredient {}", id)));
    }

    let usage = Ingredient::get_usage_count(&conn, id)?;
    if usage > 0 {
        return Err(AppError::invalid_input(format!(
            "Ingredient {} is used by {} recipe(s) and cannot be deleted",
            id, usage
        )));
    }

    Ingredient::delete(&conn, id)?;
    info!(ingredient_id = id, "deleted ingredient");
    Ok(())
}

/// Parse one `name,unit` row; the unit is whatever follows the last comma
fn parse_row(line: &str) -> Result<IngredientCreate, String> {
    let (name, unit) = line
        .rsplit_once(',')
        .ok_or_else(|| "expected 'name,measurement_unit'".to_string())?;
    let mut data = IngredientCreate {
        name: name.trim().trim_matches('"').to_string(),
        measurement_unit: unit.trim().trim_matches('"').to_string(),
    };
    data.validate()?;
    Ok(data)
}

/// Import `name,measurement_unit` rows. A leading header row is skipped, as
/// are blank lines and rows already present.
pub fn import_csv<R: BufRead>(db: &Database, reader: R) -> AppResult<ImportSummary> {
    let mut summary = ImportSummary::default();
    let mut conn = db.get_conn()?;
    let tx = conn.transaction().map_err(crate::db::DbError::from)?;

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| {
            AppError::invalid_input(format!("Error reading line {}: {}", line_num + 1, e))
        })?;

        if line.trim().is_empty() {
            continue;
        }
        if line_num == 0 && line.trim().eq_ignore_ascii_case("name,measurement_unit") {
            continue;
        }

        summary.total_rows += 1;
        let data = match parse_row(&line) {
            Ok(d) => d,
            Err(e) => {
                summary.errors.push(format!("Row {}: {}", line_num + 1, e));
                continue;
            }
        };

        if Ingredient::insert_if_absent(&tx, &data)? {
            summary.inserted += 1;
        } else {
            summary.skipped += 1;
        }
    }

    tx.commit().map_err(crate::db::DbError::from)?;

    if !summary.errors.is_empty() {
        warn!(errors = summary.errors.len(), "some ingredient rows were rejected");
    }
    info!(
        inserted = summary.inserted,
        skipped = summary.skipped,
        "imported ingredients"
    );
    Ok(summary)
}
