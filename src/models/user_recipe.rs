//! Per-user recipe lists
//!
//! Favorites and the shopping cart share one shape: a set of
//! (user, recipe) pairs.

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// Which per-user list a pair belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeList {
    Favorites,
    ShoppingCart,
}

impl RecipeList {
    fn table(self) -> &'static str {
        match self {
            RecipeList::Favorites => "favorites",
            RecipeList::ShoppingCart => "shopping_cart",
        }
    }

    /// Human readable name used in messages
    pub fn label(self) -> &'static str {
        match self {
            RecipeList::Favorites => "favorites",
            RecipeList::ShoppingCart => "shopping cart",
        }
    }

    /// Insert the pair; a duplicate surfaces as a unique violation
    pub fn add(self, conn: &Connection, user_id: i64, recipe_id: i64) -> DbResult<()> {
        let sql = format!(
            "INSERT INTO {} (user_id, recipe_id) VALUES (?1, ?2)",
            self.table()
        );
        conn.execute(&sql, params![user_id, recipe_id])?;
        Ok(())
    }

    /// Returns Ok(false) if the pair was not present
    pub fn remove(self, conn: &Connection, user_id: i64, recipe_id: i64) -> DbResult<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE user_id = ?1 AND recipe_id = ?2",
            self.table()
        );
        let rows = conn.execute(&sql, params![user_id, recipe_id])?;
        Ok(rows > 0)
    }

    pub fn contains(self, conn: &Connection, user_id: i64, recipe_id: i64) -> DbResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE user_id = ?1 AND recipe_id = ?2)",
            self.table()
        );
        let found: bool = conn.query_row(&sql, params![user_id, recipe_id], |row| row.get(0))?;
        Ok(found)
    }
}
