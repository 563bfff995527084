//! Tag routes

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use super::{run_blocking, AppJson, AppPath, AppState, CurrentUser};
use crate::error::AppError;
use crate::models::{TagCreate, TagUpdate};
use crate::services::tags;

pub struct TagRoutes;

impl TagRoutes {
    pub fn routes(state: AppState) -> Router {
        Router::new()
            .route("/api/tags", get(Self::list).post(Self::create))
            .route(
                "/api/tags/:id",
                get(Self::get).patch(Self::update).delete(Self::delete),
            )
            .with_state(state)
    }

    async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
        let result = run_blocking(&state.db, |db| tags::list_tags(&db)).await?;
        Ok(Json(result))
    }

    async fn get(
        State(state): State<AppState>,
        AppPath(id): AppPath<i64>,
    ) -> Result<impl IntoResponse, AppError> {
        let tag = run_blocking(&state.db, move |db| tags::get_tag(&db, id)).await?;
        Ok(Json(tag))
    }

    async fn create(
        State(state): State<AppState>,
        CurrentUser(_): CurrentUser,
        AppJson(data): AppJson<TagCreate>,
    ) -> Result<impl IntoResponse, AppError> {
        let tag = run_blocking(&state.db, move |db| tags::create_tag(&db, data)).await?;
        Ok((StatusCode::CREATED, Json(tag)))
    }

    async fn update(
        State(state): State<AppState>,
        CurrentUser(_): CurrentUser,
        AppPath(id): AppPath<i64>,
        AppJson(data): AppJson<TagUpdate>,
    ) -> Result<impl IntoResponse, AppError> {
        let tag = run_blocking(&state.db, move |db| tags::update_tag(&db, id, data)).await?;
        Ok(Json(tag))
    }

    async fn delete(
        State(state): State<AppState>,
        CurrentUser(_): CurrentUser,
        AppPath(id): AppPath<i64>,
    ) -> Result<impl IntoResponse, AppError> {
        run_blocking(&state.db, move |db| tags::delete_tag(&db, id)).await?;
        Ok(StatusCode::NO_CONTENT)
    }
}
