//! Recipe model
//!
//! A published recipe. Tags live in `recipe_tags`, ingredient lines in
//! `recipe_ingredients` (see [`super::RecipeIngredient`]).

use std::collections::HashSet;

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

pub const MAX_NAME_LEN: usize = 256;
/// Upper bound for one ingredient line; matches the schema CHECK
pub const MAX_AMOUNT: i64 = 32_767;

/// A recipe row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub author_id: i64,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
    pub pub_date: String,
}

/// One requested ingredient line in a create/update payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientAmount {
    /// Ingredient id
    pub id: i64,
    pub amount: i64,
}

/// Data for creating a new recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCreate {
    pub name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image: String,
    pub cooking_time: i64,
    pub tags: Vec<i64>,
    pub ingredients: Vec<IngredientAmount>,
}

/// Data for updating a recipe; `tags`/`ingredients` replace the current sets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeUpdate {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<i64>,
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<IngredientAmount>>,
}

impl RecipeCreate {
    pub fn validate(&mut self) -> Result<(), String> {
        self.name = self.name.trim().to_string();
        validate_name(&self.name)?;
        validate_cooking_time(self.cooking_time)?;
        validate_tags(&self.tags)?;
        validate_ingredients(&self.ingredients)
    }
}

impl RecipeUpdate {
    pub fn validate(&mut self) -> Result<(), String> {
        if let Some(name) = self.name.as_mut() {
            *name = name.trim().to_string();
            validate_name(name)?;
        }
        if let Some(minutes) = self.cooking_time {
            validate_cooking_time(minutes)?;
        }
        if let Some(ref tags) = self.tags {
            validate_tags(tags)?;
        }
        if let Some(ref ingredients) = self.ingredients {
            validate_ingredients(ingredients)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Recipe name cannot be empty".to_string());
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(format!("Recipe name must be at most {} characters", MAX_NAME_LEN));
    }
    Ok(())
}

fn validate_cooking_time(minutes: i64) -> Result<(), String> {
    if minutes < 1 {
        return Err("cooking_time must be at least 1 minute".to_string());
    }
    Ok(())
}

fn validate_tags(tags: &[i64]) -> Result<(), String> {
    if tags.is_empty() {
        return Err("A recipe needs at least one tag".to_string());
    }
    let mut seen = HashSet::new();
    for id in tags {
        if !seen.insert(id) {
            return Err(format!("Tag {} is listed more than once", id));
        }
    }
    Ok(())
}

fn validate_ingredients(ingredients: &[IngredientAmount]) -> Result<(), String> {
    if ingredients.is_empty() {
        return Err("A recipe needs at least one ingredient".to_string());
    }
    let mut seen = HashSet::new();
    for line in ingredients {
        if !(1..=MAX_AMOUNT).contains(&line.amount) {
            return Err(format!(
                "Amount for ingredient {} must be between 1 and {}",
                line.id, MAX_AMOUNT
            ));
        }
        if !seen.insert(line.id) {
            return Err(format!(
                "Ingredient {} is listed more than once; ingredients must not repeat",
                line.id
            ));
        }
    }
    Ok(())
}

/// Filters for recipe listing
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub author: Option<i64>,
    /// Tag slugs; a recipe matches if it carries any of them
    pub tags: Vec<String>,
    pub favorited_by: Option<i64>,
    pub in_cart_of: Option<i64>,
}

impl RecipeFilter {
    fn where_clause(&self) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(author) = self.author {
            conditions.push(format!("r.author_id = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(author));
        }
        if !self.tags.is_empty() {
            let mut placeholders = Vec::new();
            for slug in &self.tags {
                placeholders.push(format!("?{}", params_vec.len() + 1));
                params_vec.push(Box::new(slug.clone()));
            }
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id \
                 WHERE rt.recipe_id = r.id AND t.slug IN ({}))",
                placeholders.join(", ")
            ));
        }
        if let Some(user_id) = self.favorited_by {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ?{})",
                params_vec.len() + 1
            ));
            params_vec.push(Box::new(user_id));
        }
        if let Some(user_id) = self.in_cart_of {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM shopping_cart s WHERE s.recipe_id = r.id AND s.user_id = ?{})",
                params_vec.len() + 1
            ));
            params_vec.push(Box::new(user_id));
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        (clause, params_vec)
    }
}

impl Recipe {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            author_id: row.get("author_id")?,
            name: row.get("name")?,
            image: row.get("image")?,
            text: row.get("text")?,
            cooking_time: row.get("cooking_time")?,
            pub_date: row.get("pub_date")?,
        })
    }

    /// Insert the recipe row only; tags and ingredient lines are stored separately
    pub fn create(conn: &Connection, author_id: i64, data: &RecipeCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO recipes (author_id, name, image, text, cooking_time)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![author_id, data.name, data.image, data.text, data.cooking_time],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let recipe = conn
            .query_row("SELECT * FROM recipes WHERE id = ?1", [id], Self::from_row)
            .optional()?;
        Ok(recipe)
    }

    /// Newest first
    pub fn list(
        conn: &Connection,
        filter: &RecipeFilter,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let (clause, mut params_vec) = filter.where_clause();
        let sql = format!(
            "SELECT r.* FROM recipes r {} ORDER BY r.pub_date DESC, r.id DESC LIMIT ?{} OFFSET ?{}",
            clause,
            params_vec.len() + 1,
            params_vec.len() + 2
        );
        params_vec.push(Box::new(limit));
        params_vec.push(Box::new(offset));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let recipes = stmt
            .query_map(params_refs.as_slice(), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    pub fn count(conn: &Connection, filter: &RecipeFilter) -> DbResult<i64> {
        let (clause, params_vec) = filter.where_clause();
        let sql = format!("SELECT COUNT(*) FROM recipes r {}", clause);
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let count: i64 = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
        Ok(count)
    }

    /// An author's recipes, newest first, optionally truncated
    pub fn list_by_author(
        conn: &Connection,
        author_id: i64,
        limit: Option<i64>,
    ) -> DbResult<Vec<Self>> {
        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.unwrap_or(-1);
        let mut stmt = conn.prepare(
            "SELECT * FROM recipes WHERE author_id = ?1 ORDER BY pub_date DESC, id DESC LIMIT ?2",
        )?;
        let recipes = stmt
            .query_map(params![author_id, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    pub fn count_by_author(conn: &Connection, author_id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM recipes WHERE author_id = ?1",
            [author_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Update scalar fields; tags and ingredient lines are handled by the caller
    pub fn update(conn: &Connection, id: i64, data: &RecipeUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(ref text) = data.text {
            updates.push(format!("text = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(text.clone()));
        }
        if let Some(ref image) = data.image {
            updates.push(format!("image = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(image.clone()));
        }
        if let Some(minutes) = data.cooking_time {
            updates.push(format!("cooking_time = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(minutes));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        let sql = format!(
            "UPDATE recipes SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Replace the recipe's tag set
    pub fn set_tags(conn: &Connection, recipe_id: i64, tag_ids: &[i64]) -> DbResult<()> {
        conn.execute("DELETE FROM recipe_tags WHERE recipe_id = ?1", [recipe_id])?;
        let mut stmt =
            conn.prepare("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES (?1, ?2)")?;
        for tag_id in tag_ids {
            stmt.execute(params![recipe_id, tag_id])?;
        }
        Ok(())
    }

    /// Delete will cascade to ingredient lines, tags, favorites and cart entries
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
