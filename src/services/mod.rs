//! Foodgram services
//!
//! Request-scoped operations shared by the HTTP and MCP surfaces. Every
//! operation takes the [`Database`](crate::db::Database) and, where it acts on
//! behalf of someone, the [`RequestUser`] explicitly.

pub mod ingredients;
pub mod recipes;
pub mod subscriptions;
pub mod tags;
pub mod user_recipes;
pub mod users;

use serde::{Deserialize, Serialize};

use crate::config::MAX_PAGE_SIZE;
use crate::db::DbError;
use crate::error::{AppError, AppResult};

/// The authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestUser {
    pub id: i64,
}

impl RequestUser {
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

/// Raw `?page=&limit=` query values
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// A validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self { page, limit }
    }

    /// Apply defaults; `limit` is clamped to `1..=MAX_PAGE_SIZE`
    pub fn resolve(self, default_limit: u32) -> AppResult<Pagination> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(AppError::invalid_input("page must be at least 1"));
        }
        let limit = self.limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE);
        Ok(Pagination { page, limit })
    }
}

impl Pagination {
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }

    /// Pages past the end are an error, except the first page of an empty set
    pub fn check(&self, count: i64) -> AppResult<()> {
        if self.page > 1 && self.offset() >= count {
            return Err(AppError::not_found(format!("Page {}", self.page)));
        }
        Ok(())
    }

    pub fn wrap<T>(&self, count: i64, results: Vec<T>) -> Page<T> {
        let has_next = self.offset() + (results.len() as i64) < count;
        Page {
            count,
            next: has_next.then(|| self.page + 1),
            previous: (self.page > 1).then(|| self.page - 1),
            results,
        }
    }
}

/// A page of results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

/// Map a unique-constraint failure to a conflict, anything else to a database error
pub(crate) fn conflict_or_db(err: DbError, message: impl Into<String>) -> AppError {
    if err.is_unique_violation() {
        AppError::already_exists(message)
    } else {
        err.into()
    }
}
