//! User and subscription routes

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{run_blocking, AppJson, AppPath, AppQuery, AppState, CurrentUser, MaybeUser};
use crate::error::AppError;
use crate::models::{UserCreate, UserUpdate};
use crate::services::{subscriptions, users, PageRequest};

#[derive(Debug, Deserialize)]
struct UserListParams {
    page: Option<u32>,
    limit: Option<u32>,
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionParams {
    page: Option<u32>,
    limit: Option<u32>,
    recipes_limit: Option<i64>,
}

/// User routes container
pub struct UserRoutes;

impl UserRoutes {
    pub fn routes(state: AppState) -> Router {
        Router::new()
            .route("/api/users", get(Self::list).post(Self::register))
            .route("/api/users/me", get(Self::me).patch(Self::update_me))
            .route("/api/users/set_password", post(Self::set_password))
            .route("/api/users/subscriptions", get(Self::subscriptions))
            .route("/api/users/:id", get(Self::get))
            .route(
                "/api/users/:id/subscribe",
                post(Self::subscribe).delete(Self::unsubscribe),
            )
            .with_state(state)
    }

    async fn list(
        State(state): State<AppState>,
        MaybeUser(viewer): MaybeUser,
        AppQuery(params): AppQuery<UserListParams>,
    ) -> Result<impl IntoResponse, AppError> {
        let page = PageRequest::new(params.page, params.limit);
        let page_size = state.page_size();
        let result = run_blocking(&state.db, move |db| {
            users::list_users(&db, viewer, params.search.as_deref(), page, page_size)
        })
        .await?;
        Ok(Json(result))
    }

    async fn register(
        State(state): State<AppState>,
        AppJson(data): AppJson<UserCreate>,
    ) -> Result<impl IntoResponse, AppError> {
        let user = run_blocking(&state.db, move |db| users::register(&db, data)).await?;
        Ok((StatusCode::CREATED, Json(user)))
    }

    async fn get(
        State(state): State<AppState>,
        MaybeUser(viewer): MaybeUser,
        AppPath(id): AppPath<i64>,
    ) -> Result<impl IntoResponse, AppError> {
        let user = run_blocking(&state.db, move |db| users::get_user(&db, viewer, id)).await?;
        Ok(Json(user))
    }

    async fn me(
        State(state): State<AppState>,
        CurrentUser(user): CurrentUser,
    ) -> Result<impl IntoResponse, AppError> {
        let view = run_blocking(&state.db, move |db| users::me(&db, user)).await?;
        Ok(Json(view))
    }

    async fn update_me(
        State(state): State<AppState>,
        CurrentUser(user): CurrentUser,
        AppJson(data): AppJson<UserUpdate>,
    ) -> Result<impl IntoResponse, AppError> {
        let view = run_blocking(&state.db, move |db| users::update_me(&db, user, data)).await?;
        Ok(Json(view))
    }

    async fn set_password(
        State(state): State<AppState>,
        CurrentUser(user): CurrentUser,
        AppJson(data): AppJson<users::SetPassword>,
    ) -> Result<impl IntoResponse, AppError> {
        run_blocking(&state.db, move |db| users::set_password(&db, user, data)).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    async fn subscriptions(
        State(state): State<AppState>,
        CurrentUser(user): CurrentUser,
        AppQuery(params): AppQuery<SubscriptionParams>,
    ) -> Result<impl IntoResponse, AppError> {
        let page = PageRequest::new(params.page, params.limit);
        let page_size = state.page_size();
        let result = run_blocking(&state.db, move |db| {
            subscriptions::list_subscriptions(&db, user, page, page_size, params.recipes_limit)
        })
        .await?;
        Ok(Json(result))
    }

    async fn subscribe(
        State(state): State<AppState>,
        CurrentUser(user): CurrentUser,
        AppPath(author_id): AppPath<i64>,
        AppQuery(params): AppQuery<SubscriptionParams>,
    ) -> Result<impl IntoResponse, AppError> {
        let view = run_blocking(&state.db, move |db| {
            subscriptions::subscribe(&db, user, author_id, params.recipes_limit)
        })
        .await?;
        Ok((StatusCode::CREATED, Json(view)))
    }

    async fn unsubscribe(
        State(state): State<AppState>,
        CurrentUser(user): CurrentUser,
        AppPath(author_id): AppPath<i64>,
    ) -> Result<impl IntoResponse, AppError> {
        run_blocking(&state.db, move |db| subscriptions::unsubscribe(&db, user, author_id)).await?;
        Ok(StatusCode::NO_CONTENT)
    }
}
