//! Auth token model
//!
//! Tokens are minted by the external auth service; this crate only resolves
//! them to users.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DbResult;

#[derive(Debug, Clone)]
pub struct AuthToken {
    pub key: String,
    pub user_id: i64,
}

impl AuthToken {
    /// Store a token for a user
    pub fn insert(conn: &Connection, user_id: i64, key: &str) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO auth_tokens (key, user_id) VALUES (?1, ?2)",
            params![key, user_id],
        )?;
        Ok(Self {
            key: key.to_string(),
            user_id,
        })
    }

    /// Resolve a token key to its owner
    pub fn user_id_for_key(conn: &Connection, key: &str) -> DbResult<Option<i64>> {
        let user_id = conn
            .query_row(
                "SELECT user_id FROM auth_tokens WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(user_id)
    }
}
