//! HTTP API
//!
//! axum router for the `/api` surface. Handlers run their database work on
//! the blocking pool and pass the authenticated caller explicitly into the
//! services.

pub mod auth;
pub mod extract;
pub mod ingredients;
pub mod recipes;
pub mod tags;
pub mod users;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, AppResult};

pub use auth::{CurrentUser, MaybeUser};
pub use extract::{AppJson, AppPath, AppQuery};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.config.page_size
    }
}

/// Build the full API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(users::UserRoutes::routes(state.clone()))
        .merge(tags::TagRoutes::routes(state.clone()))
        .merge(ingredients::IngredientRoutes::routes(state.clone()))
        .merge(recipes::RecipeRoutes::routes(state))
        .layer(TraceLayer::new_for_http())
}

/// Run a service call on the blocking pool
pub(crate) async fn run_blocking<F, T>(db: &Database, f: F) -> AppResult<T>
where
    F: FnOnce(Database) -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || f(db)).await?
}

/// Parse `1/0/true/false` query flags
pub(crate) fn parse_flag(name: &str, value: Option<&str>) -> AppResult<bool> {
    match value.map(str::trim) {
        None | Some("") => Ok(false),
        Some("1") => Ok(true),
        Some("0") => Ok(false),
        Some(v) if v.eq_ignore_ascii_case("true") => Ok(true),
        Some(v) if v.eq_ignore_ascii_case("false") => Ok(false),
        Some(v) => Err(AppError::invalid_input(format!(
            "{} must be one of 1, 0, true, false (got '{}')",
            name, v
        ))),
    }
}
