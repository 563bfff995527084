//! Recipe ingredient lines
//!
//! Each row links a recipe to an ingredient with an integer amount in the
//! ingredient's own unit.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::recipe::IngredientAmount;
use crate::db::DbResult;

/// An ingredient line joined with its reference data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    /// Ingredient id
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// One ingredient line belonging to a recipe in someone's shopping cart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

impl RecipeIngredient {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            measurement_unit: row.get("measurement_unit")?,
            amount: row.get("amount")?,
        })
    }

    /// Replace all of a recipe's ingredient lines
    pub fn replace_for_recipe(
        conn: &Connection,
        recipe_id: i64,
        items: &[IngredientAmount],
    ) -> DbResult<()> {
        conn.execute(
            "DELETE FROM recipe_ingredients WHERE recipe_id = ?1",
            [recipe_id],
        )?;
        let mut stmt = conn.prepare(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES (?1, ?2, ?3)",
        )?;
        for item in items {
            stmt.execute(params![recipe_id, item.id, item.amount])?;
        }
        Ok(())
    }

    /// A recipe's lines in insertion order
    pub fn get_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT i.id, i.name, i.measurement_unit, ri.amount
            FROM recipe_ingredients ri
            INNER JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id = ?1
            ORDER BY ri.id
            "#,
        )?;
        let lines = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines)
    }
}

impl CartLine {
    /// Every ingredient line of every recipe in the user's cart, unaggregated
    pub fn for_user(conn: &Connection, user_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT i.name, i.measurement_unit, ri.amount
            FROM shopping_cart sc
            INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
            INNER JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE sc.user_id = ?1
            "#,
        )?;
        let lines = stmt
            .query_map([user_id], |row| {
                Ok(Self {
                    name: row.get(0)?,
                    measurement_unit: row.get(1)?,
                    amount: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines)
    }
}
