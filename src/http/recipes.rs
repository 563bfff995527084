//! Recipe routes
//!
//! Recipe CRUD, the favorite and cart toggles, and the shopping list in both
//! JSON and PDF form.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{
    parse_flag, run_blocking, AppJson, AppPath, AppQuery, AppState, CurrentUser, MaybeUser,
};
use crate::error::AppError;
use crate::models::{RecipeCreate, RecipeList, RecipeUpdate};
use crate::services::recipes::{self, RecipeQuery};
use crate::services::{user_recipes, PageRequest};
use crate::shopping_list;

/// `GET /api/recipes` query; `tags` may repeat
#[derive(Debug, Deserialize)]
struct RecipeListParams {
    page: Option<u32>,
    limit: Option<u32>,
    author: Option<i64>,
    #[serde(default)]
    tags: Vec<String>,
    is_favorited: Option<String>,
    is_in_shopping_cart: Option<String>,
}

impl RecipeListParams {
    fn into_query(self) -> Result<(RecipeQuery, PageRequest), AppError> {
        let query = RecipeQuery {
            author: self.author,
            tags: self.tags,
            is_favorited: parse_flag("is_favorited", self.is_favorited.as_deref())?,
            is_in_shopping_cart: parse_flag(
                "is_in_shopping_cart",
                self.is_in_shopping_cart.as_deref(),
            )?,
        };
        Ok((query, PageRequest::new(self.page, self.limit)))
    }
}

pub struct RecipeRoutes;

impl RecipeRoutes {
    pub fn routes(state: AppState) -> Router {
        Router::new()
            .route("/api/recipes", get(Self::list).post(Self::create))
            .route("/api/recipes/shopping_cart", get(Self::shopping_list))
            .route(
                "/api/recipes/download_shopping_cart",
                get(Self::download_shopping_list),
            )
            .route(
                "/api/recipes/:id",
                get(Self::get).patch(Self::update).delete(Self::delete),
            )
            .route(
                "/api/recipes/:id/favorite",
                post(Self::add_favorite).delete(Self::remove_favorite),
            )
            .route(
                "/api/recipes/:id/shopping_cart",
                post(Self::add_to_cart).delete(Self::remove_from_cart),
            )
            .with_state(state)
    }

    async fn list(
        State(state): State<AppState>,
        MaybeUser(viewer): MaybeUser,
        AppQuery(params): AppQuery<RecipeListParams>,
    ) -> Result<impl IntoResponse, AppError> {
        let (query, page) = params.into_query()?;
        let page_size = state.page_size();
        let result = run_blocking(&state.db, move |db| {
            recipes::list_recipes(&db, viewer, query, page, page_size)
        })
        .await?;
        Ok(Json(result))
    }

    async fn get(
        State(state): State<AppState>,
        MaybeUser(viewer): MaybeUser,
        AppPath(id): AppPath<i64>,
    ) -> Result<impl IntoResponse, AppError> {
        let recipe = run_blocking(&state.db, move |db| recipes::get_recipe(&db, viewer, id)).await?;
        Ok(Json(recipe))
    }

    async fn create(
        State(state): State<AppState>,
        CurrentUser(user): CurrentUser,
        AppJson(data): AppJson<RecipeCreate>,
    ) -> Result<impl IntoResponse, AppError> {
        let recipe = run_blocking(&state.db, move |db| recipes::create_recipe(&db, user, data)).await?;
        Ok((StatusCode::CREATED, Json(recipe)))
    }

    async fn update(
        State(state): State<AppState>,
        CurrentUser(user): CurrentUser,
        AppPath(id): AppPath<i64>,
        AppJson(data): AppJson<RecipeUpdate>,
    ) -> Result<impl IntoResponse, AppError> {
        let recipe =
            run_blocking(&state.db, move |db| recipes::update_recipe(&db, user, id, data)).await?;
        Ok(Json(recipe))
    }

    async fn delete(
        State(state): State<AppState>,
        CurrentUser(user): CurrentUser,
        AppPath(id): AppPath<i64>,
    ) -> Result<impl IntoResponse, AppError> {
        run_blocking(&state.db, move |db| recipes::delete_recipe(&db, user, id)).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    async fn add_favorite(
        State(state): State<AppState>,
        CurrentUser(user): CurrentUser,
        AppPath(id): AppPath<i64>,
    ) -> Result<impl IntoResponse, AppError> {
        let recipe = run_blocking(&state.db, move |db| {
            user_recipes::add(&db, user, RecipeList::Favorites, id)
        })
        .await?;
        Ok((StatusCode::CREATED, Json(recipe)))
    }

    async fn remove_favorite(
        State(state): State<AppState>,
        CurrentUser(user): CurrentUser,
        AppPath(id): AppPath<i64>,
    ) -> Result<impl IntoResponse, AppError> {
        run_blocking(&state.db, move |db| {
            user_recipes::remove(&db, user, RecipeList::Favorites, id)
        })
        .await?;
        Ok(StatusCode::NO_CONTENT)
    }

    async fn add_to_cart(
        State(state): State<AppState>,
        CurrentUser(user): CurrentUser,
        AppPath(id): AppPath<i64>,
    ) -> Result<impl IntoResponse, AppError> {
        let recipe = run_blocking(&state.db, move |db| {
            user_recipes::add(&db, user, RecipeList::ShoppingCart, id)
        })
        .await?;
        Ok((StatusCode::CREATED, Json(recipe)))
    }

    async fn remove_from_cart(
        State(state): State<AppState>,
        CurrentUser(user): CurrentUser,
        AppPath(id): AppPath<i64>,
    ) -> Result<impl IntoResponse, AppError> {
        run_blocking(&state.db, move |db| {
            user_recipes::remove(&db, user, RecipeList::ShoppingCart, id)
        })
        .await?;
        Ok(StatusCode::NO_CONTENT)
    }

    async fn shopping_list(
        State(state): State<AppState>,
        CurrentUser(user): CurrentUser,
    ) -> Result<impl IntoResponse, AppError> {
        let items = run_blocking(&state.db, move |db| shopping_list::for_user(&db, user)).await?;
        Ok(Json(items))
    }

    /// The rendered list as a `shopping_list.pdf` attachment
    async fn download_shopping_list(
        State(state): State<AppState>,
        CurrentUser(user): CurrentUser,
    ) -> Result<impl IntoResponse, AppError> {
        let title = state.config.shopping_list_title.clone();
        let bytes = run_blocking(&state.db, move |db| {
            shopping_list::export_pdf(&db, user, &title)
        })
        .await?;

        let headers = [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", shopping_list::FILENAME),
            ),
        ];
        Ok((StatusCode::OK, headers, bytes))
    }
}
