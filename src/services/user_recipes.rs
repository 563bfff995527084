//! Favorites and shopping cart
//!
//! Both lists behave the same way: adding twice is a conflict, removing an
//! absent entry is not-found.

use tracing::info;

use super::recipes::{load_recipe, RecipeShort};
use super::{conflict_or_db, RequestUser};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::RecipeList;

/// Put a recipe on one of the user's lists
pub fn add(
    db: &Database,
    user: RequestUser,
    list: RecipeList,
    recipe_id: i64,
) -> AppResult<RecipeShort> {
    let conn = db.get_conn()?;
    let recipe = load_recipe(&conn, recipe_id)?;

    list.add(&conn, user.id, recipe_id).map_err(|e| {
        conflict_or_db(
            e,
            format!("Recipe {} is already in your {}", recipe_id, list.label()),
        )
    })?;

    info!(user_id = user.id, recipe_id, list = list.label(), "added recipe to list");
    Ok(RecipeShort::from(recipe))
}

/// Take a recipe off one of the user's lists
pub fn remove(db: &Database, user: RequestUser, list: RecipeList, recipe_id: i64) -> AppResult<()> {
    let conn = db.get_conn()?;
    load_recipe(&conn, recipe_id)?;

    if !list.remove(&conn, user.id, recipe_id)? {
        return Err(AppError::not_found(format!(
            "Recipe {} in your {}",
            recipe_id,
            list.label()
        )));
    }

    info!(user_id = user.id, recipe_id, list = list.label(), "removed recipe from list");
    Ok(())
}
