//! Subscription model
//!
//! A follower/author pair. Self-subscription is refused by a CHECK
//! constraint as well as by the service layer.

use rusqlite::{params, Connection};

use super::user::User;
use crate::db::DbResult;

pub struct Subscription;

impl Subscription {
    /// A duplicate surfaces as a unique violation
    pub fn create(conn: &Connection, user_id: i64, author_id: i64) -> DbResult<()> {
        conn.execute(
            "INSERT INTO subscriptions (user_id, author_id) VALUES (?1, ?2)",
            params![user_id, author_id],
        )?;
        Ok(())
    }

    /// Returns Ok(false) if no such subscription existed
    pub fn delete(conn: &Connection, user_id: i64, author_id: i64) -> DbResult<bool> {
        let rows = conn.execute(
            "DELETE FROM subscriptions WHERE user_id = ?1 AND author_id = ?2",
            params![user_id, author_id],
        )?;
        Ok(rows > 0)
    }

    pub fn exists(conn: &Connection, user_id: i64, author_id: i64) -> DbResult<bool> {
        let found: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE user_id = ?1 AND author_id = ?2)",
            params![user_id, author_id],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    /// Authors the user follows, most recently followed first
    pub fn list_authors(
        conn: &Connection,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<User>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT s.author_id FROM subscriptions s
            WHERE s.user_id = ?1
            ORDER BY s.id DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )?;
        let ids = stmt
            .query_map(params![user_id, limit, offset], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut authors = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(author) = User::get_by_id(conn, id)? {
                authors.push(author);
            }
        }
        Ok(authors)
    }

    pub fn count(conn: &Connection, user_id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM subscriptions WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
