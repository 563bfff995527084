//! User model
//!
//! Registered accounts. The password hash never leaves this module in a
//! serialized form.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::escape_like;
use crate::db::DbResult;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// A registered user
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
}

/// Registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
}

/// Partial profile update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserCreate {
    /// Trim fields and check them; returns the first problem found
    pub fn validate(&mut self) -> Result<(), String> {
        self.email = self.email.trim().to_string();
        self.username = self.username.trim().to_string();
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();

        validate_email(&self.email)?;
        validate_username(&self.username)?;
        validate_password(&self.password)
    }
}

impl UserUpdate {
    pub fn validate(&mut self) -> Result<(), String> {
        if let Some(email) = self.email.as_mut() {
            *email = email.trim().to_string();
            validate_email(email)?;
        }
        if let Some(username) = self.username.as_mut() {
            *username = username.trim().to_string();
            validate_username(username)?;
        }
        if let Some(first) = self.first_name.as_mut() {
            *first = first.trim().to_string();
        }
        if let Some(last) = self.last_name.as_mut() {
            *last = last.trim().to_string();
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), String> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };
    if valid && !email.contains(char::is_whitespace) {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid email address", email))
    }
}

fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("username cannot be empty".to_string());
    }
    if username.len() > 150 {
        return Err("username must be at most 150 characters".to_string());
    }
    // Same character class as the usual `@/./+/-/_` username validator
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(
            "username may contain only letters, digits and @/./+/-/_ characters".to_string(),
        );
    }
    Ok(())
}

fn contains_pattern(q: &str) -> String {
    format!("%{}%", escape_like(q))
}

/// Password policy shared by registration and password change
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "password must contain at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err("password cannot be entirely numeric".to_string());
    }
    Ok(())
}

impl User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
            username: row.get("username")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            password_hash: row.get("password_hash")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Insert a new user with an already hashed password
    pub fn create(conn: &Connection, data: &UserCreate, password_hash: &str) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO users (email, username, first_name, last_name, password_hash)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                data.email,
                data.username,
                data.first_name,
                data.last_name,
                password_hash,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let user = conn
            .query_row("SELECT * FROM users WHERE id = ?1", [id], Self::from_row)
            .optional()?;
        Ok(user)
    }

    /// Look a user up by username or email
    pub fn find_by_login(conn: &Connection, login: &str) -> DbResult<Option<Self>> {
        let user = conn
            .query_row(
                "SELECT * FROM users WHERE username = ?1 OR email = ?1",
                [login],
                Self::from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn exists(conn: &Connection, id: i64) -> DbResult<bool> {
        let found: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
            [id],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    /// List users ordered by id, optionally filtered by a username substring
    pub fn list(
        conn: &Connection,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let users = match search {
            Some(q) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM users WHERE username LIKE ?1 ESCAPE '\\'
                     ORDER BY id LIMIT ?2 OFFSET ?3",
                )?;
                let rows = stmt
                    .query_map(params![contains_pattern(q), limit, offset], Self::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt =
                    conn.prepare("SELECT * FROM users ORDER BY id LIMIT ?1 OFFSET ?2")?;
                let rows = stmt
                    .query_map(params![limit, offset], Self::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(users)
    }

    pub fn count(conn: &Connection, search: Option<&str>) -> DbResult<i64> {
        let count: i64 = match search {
            Some(q) => conn.query_row(
                "SELECT COUNT(*) FROM users WHERE username LIKE ?1 ESCAPE '\\'",
                [contains_pattern(q)],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?,
        };
        Ok(count)
    }

    /// Apply a partial update
    pub fn update(conn: &Connection, id: i64, data: &UserUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref email) = data.email {
            updates.push(format!("email = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(email.clone()));
        }
        if let Some(ref username) = data.username {
            updates.push(format!("username = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(username.clone()));
        }
        if let Some(ref first_name) = data.first_name {
            updates.push(format!("first_name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(first_name.clone()));
        }
        if let Some(ref last_name) = data.last_name {
            updates.push(format!("last_name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(last_name.clone()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        let sql = format!(
            "UPDATE users SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    pub fn set_password_hash(conn: &Connection, id: i64, password_hash: &str) -> DbResult<()> {
        conn.execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            params![password_hash, id],
        )?;
        Ok(())
    }
}
