//! Tag model
//!
//! Recipe labels with a display color and URL slug.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagCreate {
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    pub slug: String,
}

fn default_color() -> String {
    "#FF0000".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub slug: Option<String>,
}

impl TagCreate {
    pub fn validate(&mut self) -> Result<(), String> {
        self.name = self.name.trim().to_string();
        self.slug = self.slug.trim().to_string();
        self.color = normalize_color(&self.color)?;
        validate_name(&self.name)?;
        validate_slug(&self.slug)
    }
}

impl TagUpdate {
    pub fn validate(&mut self) -> Result<(), String> {
        if let Some(name) = self.name.as_mut() {
            *name = name.trim().to_string();
            validate_name(name)?;
        }
        if let Some(slug) = self.slug.as_mut() {
            *slug = slug.trim().to_string();
            validate_slug(slug)?;
        }
        if let Some(color) = self.color.as_mut() {
            *color = normalize_color(color)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Tag name cannot be empty".to_string());
    }
    Ok(())
}

fn validate_slug(slug: &str) -> Result<(), String> {
    if slug.is_empty()
        || !slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(format!(
            "'{}' is not a valid slug: use letters, digits, '-' and '_'",
            slug
        ));
    }
    Ok(())
}

/// Accepts `#RGB` or `#RRGGBB`; returns the upper-case six digit form
pub fn normalize_color(color: &str) -> Result<String, String> {
    let color = color.trim();
    let hex = color
        .strip_prefix('#')
        .filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()))
        .ok_or_else(|| format!("'{}' is not a hex color", color))?;

    let full = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect::<String>(),
        6 => hex.to_string(),
        _ => return Err(format!("'{}' is not a hex color", color)),
    };
    Ok(format!("#{}", full.to_ascii_uppercase()))
}

impl Tag {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            color: row.get("color")?,
            slug: row.get("slug")?,
        })
    }

    pub fn create(conn: &Connection, data: &TagCreate) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO tags (name, color, slug) VALUES (?1, ?2, ?3)",
            params![data.name, data.color, data.slug],
        )?;
        Ok(Self {
            id: conn.last_insert_rowid(),
            name: data.name.clone(),
            color: data.color.clone(),
            slug: data.slug.clone(),
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let tag = conn
            .query_row("SELECT * FROM tags WHERE id = ?1", [id], Self::from_row)
            .optional()?;
        Ok(tag)
    }

    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM tags ORDER BY name")?;
        let tags = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    /// Tags attached to a recipe, ordered by name
    pub fn get_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT t.* FROM tags t
            INNER JOIN recipe_tags rt ON rt.tag_id = t.id
            WHERE rt.recipe_id = ?1
            ORDER BY t.name
            "#,
        )?;
        let tags = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    /// First id in `ids` with no matching tag
    pub fn find_missing(conn: &Connection, ids: &[i64]) -> DbResult<Option<i64>> {
        let mut stmt = conn.prepare("SELECT EXISTS(SELECT 1 FROM tags WHERE id = ?1)")?;
        for &id in ids {
            let found: bool = stmt.query_row([id], |row| row.get(0))?;
            if !found {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    pub fn update(conn: &Connection, id: i64, data: &TagUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(ref color) = data.color {
            updates.push(format!("color = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(color.clone()));
        }
        if let Some(ref slug) = data.slug {
            updates.push(format!("slug = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(slug.clone()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        let sql = format!(
            "UPDATE tags SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Returns Ok(false) if the tag did not exist
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM tags WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_color() {
        assert_eq!(normalize_color("#ff0000").unwrap(), "#FF0000");
        assert_eq!(normalize_color(" #0a0 ").unwrap(), "#00AA00");
        assert!(normalize_color("ff0000").is_err());
        assert!(normalize_color("#ff00").is_err());
        assert!(normalize_color("#gg0000").is_err());
    }

    #[test]
    fn test_tag_validation() {
        let mut ok = TagCreate {
            name: " Breakfast ".to_string(),
            color: "#e26c2d".to_string(),
            slug: "breakfast".to_string(),
        };
        ok.validate().unwrap();
        assert_eq!(ok.name, "Breakfast");
        assert_eq!(ok.color, "#E26C2D");

        let mut bad_slug = TagCreate {
            name: "Lunch".to_string(),
            color: "#49B64E".to_string(),
            slug: "lunch time".to_string(),
        };
        assert!(bad_slug.validate().is_err());
    }
}
