//! Ingredient model
//!
//! Reference data identified by (name, measurement unit).

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::escape_like;
use crate::db::DbResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientCreate {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngredientUpdate {
    pub name: Option<String>,
    pub measurement_unit: Option<String>,
}

impl IngredientCreate {
    pub fn validate(&mut self) -> Result<(), String> {
        self.name = self.name.trim().to_string();
        self.measurement_unit = self.measurement_unit.trim().to_string();
        if self.name.is_empty() {
            return Err("Ingredient name cannot be empty".to_string());
        }
        if self.measurement_unit.is_empty() {
            return Err("measurement_unit cannot be empty".to_string());
        }
        Ok(())
    }
}

impl IngredientUpdate {
    pub fn validate(&mut self) -> Result<(), String> {
        if let Some(name) = self.name.as_mut() {
            *name = name.trim().to_string();
            if name.is_empty() {
                return Err("Ingredient name cannot be empty".to_string());
            }
        }
        if let Some(unit) = self.measurement_unit.as_mut() {
            *unit = unit.trim().to_string();
            if unit.is_empty() {
                return Err("measurement_unit cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl Ingredient {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            measurement_unit: row.get("measurement_unit")?,
        })
    }

    pub fn create(conn: &Connection, data: &IngredientCreate) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO ingredients (name, measurement_unit) VALUES (?1, ?2)",
            params![data.name, data.measurement_unit],
        )?;
        Ok(Self {
            id: conn.last_insert_rowid(),
            name: data.name.clone(),
            measurement_unit: data.measurement_unit.clone(),
        })
    }

    /// Insert unless (name, unit) is already present; Ok(true) if a row was added
    pub fn insert_if_absent(conn: &Connection, data: &IngredientCreate) -> DbResult<bool> {
        let rows = conn.execute(
            "INSERT OR IGNORE INTO ingredients (name, measurement_unit) VALUES (?1, ?2)",
            params![data.name, data.measurement_unit],
        )?;
        Ok(rows > 0)
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let ingredient = conn
            .query_row(
                "SELECT * FROM ingredients WHERE id = ?1",
                [id],
                Self::from_row,
            )
            .optional()?;
        Ok(ingredient)
    }

    /// List ingredients, optionally only those whose name starts with `prefix`
    pub fn list(conn: &Connection, prefix: Option<&str>) -> DbResult<Vec<Self>> {
        let ingredients = match prefix {
            Some(p) => {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT * FROM ingredients
                    WHERE name LIKE ?1 ESCAPE '\'
                    ORDER BY name, measurement_unit
                    "#,
                )?;
                let rows = stmt
                    .query_map([format!("{}%", escape_like(p))], Self::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt =
                    conn.prepare("SELECT * FROM ingredients ORDER BY name, measurement_unit")?;
                let rows = stmt
                    .query_map([], Self::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(ingredients)
    }

    /// First id in `ids` with no matching ingredient
    pub fn find_missing(conn: &Connection, ids: &[i64]) -> DbResult<Option<i64>> {
        let mut stmt = conn.prepare("SELECT EXISTS(SELECT 1 FROM ingredients WHERE id = ?1)")?;
        for &id in ids {
            let found: bool = stmt.query_row([id], |row| row.get(0))?;
            if !found {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// Number of recipe lines referencing this ingredient
    pub fn get_usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM recipe_ingredients WHERE ingredient_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn update(conn: &Connection, id: i64, data: &IngredientUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(ref unit) = data.measurement_unit {
            updates.push(format!("measurement_unit = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(unit.clone()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        let sql = format!(
            "UPDATE ingredients SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM ingredients WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
