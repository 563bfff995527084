//! Ingredient routes

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::{run_blocking, AppJson, AppPath, AppQuery, AppState, CurrentUser};
use crate::error::AppError;
use crate::models::{IngredientCreate, IngredientUpdate};
use crate::services::ingredients;

#[derive(Debug, Deserialize)]
struct IngredientSearch {
    /// Name prefix
    name: Option<String>,
}

pub struct IngredientRoutes;

impl IngredientRoutes {
    pub fn routes(state: AppState) -> Router {
        Router::new()
            .route("/api/ingredients", get(Self::list).post(Self::create))
            .route(
                "/api/ingredients/:id",
                get(Self::get).patch(Self::update).delete(Self::delete),
            )
            .with_state(state)
    }

    async fn list(
        State(state): State<AppState>,
        AppQuery(params): AppQuery<IngredientSearch>,
    ) -> Result<impl IntoResponse, AppError> {
        let result = run_blocking(&state.db, move |db| {
            ingredients::list_ingredients(&db, params.name.as_deref())
        })
        .await?;
        Ok(Json(result))
    }

    async fn get(
        State(state): State<AppState>,
        AppPath(id): AppPath<i64>,
    ) -> Result<impl IntoResponse, AppError> {
        let ingredient = run_blocking(&state.db, move |db| ingredients::get_ingredient(&db, id)).await?;
        Ok(Json(ingredient))
    }

    async fn create(
        State(state): State<AppState>,
        CurrentUser(_): CurrentUser,
        AppJson(data): AppJson<IngredientCreate>,
    ) -> Result<impl IntoResponse, AppError> {
        let ingredient =
            run_blocking(&state.db, move |db| ingredients::create_ingredient(&db, data)).await?;
        Ok((StatusCode::CREATED, Json(ingredient)))
    }

    async fn update(
        State(state): State<AppState>,
        CurrentUser(_): CurrentUser,
        AppPath(id): AppPath<i64>,
        AppJson(data): AppJson<IngredientUpdate>,
    ) -> Result<impl IntoResponse, AppError> {
        let ingredient =
            run_blocking(&state.db, move |db| ingredients::update_ingredient(&db, id, data)).await?;
        Ok(Json(ingredient))
    }

    async fn delete(
        State(state): State<AppState>,
        CurrentUser(_): CurrentUser,
        AppPath(id): AppPath<i64>,
    ) -> Result<impl IntoResponse, AppError> {
        run_blocking(&state.db, move |db| ingredients::delete_ingredient(&db, id)).await?;
        Ok(StatusCode::NO_CONTENT)
    }
}
