//! Subscription services

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::recipes::RecipeShort;
use super::users::{user_view, UserView};
use super::{conflict_or_db, Page, PageRequest, RequestUser};
use crate::db::{Database, DbResult};
use crate::error::{AppError, AppResult};
use crate::models::{Recipe, Subscription, User};

/// A followed author with a preview of their recipes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub author: UserView,
    pub recipes: Vec<RecipeShort>,
    pub recipes_count: i64,
}

fn subscription_view(
    conn: &Connection,
    viewer: RequestUser,
    author: User,
    recipes_limit: Option<i64>,
) -> DbResult<SubscriptionView> {
    let recipes = Recipe::list_by_author(conn, author.id, recipes_limit)?
        .into_iter()
        .map(RecipeShort::from)
        .collect();
    let recipes_count = Recipe::count_by_author(conn, author.id)?;
    Ok(SubscriptionView {
        author: user_view(conn, Some(viewer), author)?,
        recipes,
        recipes_count,
    })
}

fn validate_recipes_limit(recipes_limit: Option<i64>) -> AppResult<()> {
    match recipes_limit {
        Some(n) if n < 0 => Err(AppError::invalid_input("recipes_limit must not be negative")),
        _ => Ok(()),
    }
}

pub fn subscribe(
    db: &Database,
    user: RequestUser,
    author_id: i64,
    recipes_limit: Option<i64>,
) -> AppResult<SubscriptionView> {
    validate_recipes_limit(recipes_limit)?;
    let conn = db.get_conn()?;
    let author = User::get_by_id(&conn, author_id)?
        .ok_or_else(|| AppError::not_found(format!("User {}", author_id)))?;

    if author.id == user.id {
        return Err(AppError::invalid_input("You cannot subscribe to yourself"));
    }

    Subscription::create(&conn, user.id, author_id).map_err(|e| {
        conflict_or_db(e, format!("You are already subscribed to user {}", author_id))
    })?;

    info!(user_id = user.id, author_id, "subscribed");
    Ok(subscription_view(&conn, user, author, recipes_limit)?)
}

pub fn unsubscribe(db: &Database, user: RequestUser, author_id: i64) -> AppResult<()> {
    let conn = db.get_conn()?;
    if !User::exists(&conn, author_id)? {
        return Err(AppError::not_found(format!("User {}", author_id)));
    }
    if !Subscription::delete(&conn, user.id, author_id)? {
        return Err(AppError::not_found(format!(
            "Subscription to user {}",
            author_id
        )));
    }
    info!(user_id = user.id, author_id, "unsubscribed");
    Ok(())
}

/// Authors the user follows, each with up to `recipes_limit` recipes
pub fn list_subscriptions(
    db: &Database,
    user: RequestUser,
    page: PageRequest,
    default_limit: u32,
    recipes_limit: Option<i64>,
) -> AppResult<Page<SubscriptionView>> {
    validate_recipes_limit(recipes_limit)?;
    let pagination = page.resolve(default_limit)?;

    let conn = db.get_conn()?;
    let count = Subscription::count(&conn, user.id)?;
    pagination.check(count)?;

    let authors =
        Subscription::list_authors(&conn, user.id, pagination.limit(), pagination.offset())?;
    let views = authors
        .into_iter()
        .map(|a| subscription_view(&conn, user, a, recipes_limit))
        .collect::<DbResult<Vec<_>>>()?;
    Ok(pagination.wrap(count, views))
}
