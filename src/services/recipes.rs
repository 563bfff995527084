//! Recipe services
//!
//! Listing with filters, detail views and author-only mutation. Create and
//! update write the recipe row, its tags and its ingredient lines in one
//! transaction.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::users::{user_view, UserView};
use super::{conflict_or_db, Page, PageRequest, RequestUser};
use crate::db::{Database, DbError, DbResult};
use crate::error::{AppError, AppResult};
use crate::models::{
    Ingredient, IngredientAmount, Recipe, RecipeCreate, RecipeFilter, RecipeIngredient,
    RecipeList, RecipeUpdate, Tag, User,
};

const DUPLICATE_RECIPE: &str = "A recipe with that name already exists";

/// Compact recipe used inside favorites, cart and subscription payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeShort {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

impl From<Recipe> for RecipeShort {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

/// Recipe as shown in list pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeListItem {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
    pub pub_date: String,
}

/// Full recipe, returned by detail, create and update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<RecipeIngredient>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
    pub pub_date: String,
}

/// Listing filters as they arrive from a caller
#[derive(Debug, Clone, Default)]
pub struct RecipeQuery {
    pub author: Option<i64>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

struct ViewerFlags {
    is_favorited: bool,
    is_in_shopping_cart: bool,
}

fn viewer_flags(
    conn: &Connection,
    viewer: Option<RequestUser>,
    recipe_id: i64,
) -> DbResult<ViewerFlags> {
    match viewer {
        Some(v) => Ok(ViewerFlags {
            is_favorited: RecipeList::Favorites.contains(conn, v.id, recipe_id)?,
            is_in_shopping_cart: RecipeList::ShoppingCart.contains(conn, v.id, recipe_id)?,
        }),
        None => Ok(ViewerFlags {
            is_favorited: false,
            is_in_shopping_cart: false,
        }),
    }
}

fn author_view(
    conn: &Connection,
    viewer: Option<RequestUser>,
    author_id: i64,
) -> DbResult<UserView> {
    let author = User::get_by_id(conn, author_id)?
        .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))?;
    user_view(conn, viewer, author)
}

fn list_item(
    conn: &Connection,
    viewer: Option<RequestUser>,
    recipe: Recipe,
) -> DbResult<RecipeListItem> {
    let flags = viewer_flags(conn, viewer, recipe.id)?;
    Ok(RecipeListItem {
        id: recipe.id,
        tags: Tag::get_for_recipe(conn, recipe.id)?,
        author: author_view(conn, viewer, recipe.author_id)?,
        is_favorited: flags.is_favorited,
        is_in_shopping_cart: flags.is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image,
        cooking_time: recipe.cooking_time,
        pub_date: recipe.pub_date,
    })
}

fn detail(conn: &Connection, viewer: Option<RequestUser>, recipe: Recipe) -> DbResult<RecipeDetail> {
    let flags = viewer_flags(conn, viewer, recipe.id)?;
    Ok(RecipeDetail {
        id: recipe.id,
        tags: Tag::get_for_recipe(conn, recipe.id)?,
        author: author_view(conn, viewer, recipe.author_id)?,
        ingredients: RecipeIngredient::get_for_recipe(conn, recipe.id)?,
        is_favorited: flags.is_favorited,
        is_in_shopping_cart: flags.is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        pub_date: recipe.pub_date,
    })
}

pub(crate) fn load_recipe(conn: &Connection, id: i64) -> AppResult<Recipe> {
    Recipe::get_by_id(conn, id)?.ok_or_else(|| AppError::not_found(format!("Recipe {}", id)))
}

fn ensure_author(user: RequestUser, recipe: &Recipe) -> AppResult<()> {
    if recipe.author_id != user.id {
        warn!(user_id = user.id, recipe_id = recipe.id, "non-author tried to modify recipe");
        return Err(AppError::permission_denied(
            "Only the author may modify this recipe",
        ));
    }
    Ok(())
}

/// Referenced tags and ingredients must exist
fn check_references(
    conn: &Connection,
    tags: Option<&[i64]>,
    ingredients: Option<&[IngredientAmount]>,
) -> AppResult<()> {
    if let Some(tags) = tags {
        if let Some(missing) = Tag::find_missing(conn, tags)? {
            return Err(AppError::not_found(format!("Tag {}", missing)));
        }
    }
    if let Some(ingredients) = ingredients {
        let ids: Vec<i64> = ingredients.iter().map(|i| i.id).collect();
        if let Some(missing) = Ingredient::find_missing(conn, &ids)? {
            return Err(AppError::not_found(format!("Ingredient {}", missing)));
        }
    }
    Ok(())
}

/// Paginated, filtered listing, newest first
pub fn list_recipes(
    db: &Database,
    viewer: Option<RequestUser>,
    query: RecipeQuery,
    page: PageRequest,
    default_limit: u32,
) -> AppResult<Page<RecipeListItem>> {
    let pagination = page.resolve(default_limit)?;

    // Per-user filters mean nothing for an anonymous caller
    if viewer.is_none() && (query.is_favorited || query.is_in_shopping_cart) {
        pagination.check(0)?;
        return Ok(pagination.wrap(0, Vec::new()));
    }

    let filter = RecipeFilter {
        author: query.author,
        tags: query.tags,
        favorited_by: viewer.filter(|_| query.is_favorited).map(|v| v.id),
        in_cart_of: viewer.filter(|_| query.is_in_shopping_cart).map(|v| v.id),
    };

    let conn = db.get_conn()?;
    let count = Recipe::count(&conn, &filter)?;
    pagination.check(count)?;

    let recipes = Recipe::list(&conn, &filter, pagination.limit(), pagination.offset())?;
    let items = recipes
        .into_iter()
        .map(|r| list_item(&conn, viewer, r))
        .collect::<DbResult<Vec<_>>>()?;

    debug!(count, page = pagination.page, "listed recipes");
    Ok(pagination.wrap(count, items))
}

pub fn get_recipe(db: &Database, viewer: Option<RequestUser>, id: i64) -> AppResult<RecipeDetail> {
    let conn = db.get_conn()?;
    let recipe = load_recipe(&conn, id)?;
    Ok(detail(&conn, viewer, recipe)?)
}

pub fn create_recipe(
    db: &Database,
    user: RequestUser,
    mut data: RecipeCreate,
) -> AppResult<RecipeDetail> {
    data.validate().map_err(AppError::invalid_input)?;

    let mut conn = db.get_conn()?;
    let tx = conn.transaction().map_err(DbError::from)?;

    check_references(&tx, Some(&data.tags), Some(&data.ingredients))?;
    let recipe =
        Recipe::create(&tx, user.id, &data).map_err(|e| conflict_or_db(e, DUPLICATE_RECIPE))?;
    Recipe::set_tags(&tx, recipe.id, &data.tags)?;
    RecipeIngredient::replace_for_recipe(&tx, recipe.id, &data.ingredients)?;

    tx.commit().map_err(DbError::from)?;

    info!(recipe_id = recipe.id, author_id = user.id, name = %recipe.name, "created recipe");
    Ok(detail(&conn, Some(user), recipe)?)
}

pub fn update_recipe(
    db: &Database,
    user: RequestUser,
    id: i64,
    mut data: RecipeUpdate,
) -> AppResult<RecipeDetail> {
    let mut conn = db.get_conn()?;
    let existing = load_recipe(&conn, id)?;
    ensure_author(user, &existing)?;
    data.validate().map_err(AppError::invalid_input)?;

    let tx = conn.transaction().map_err(DbError::from)?;

    check_references(&tx, data.tags.as_deref(), data.ingredients.as_deref())?;
    let recipe = Recipe::update(&tx, id, &data)
        .map_err(|e| conflict_or_db(e, DUPLICATE_RECIPE))?
        .ok_or_else(|| AppError::not_found(format!("Recipe {}", id)))?;
    if let Some(ref tags) = data.tags {
        Recipe::set_tags(&tx, id, tags)?;
    }
    if let Some(ref ingredients) = data.ingredients {
        RecipeIngredient::replace_for_recipe(&tx, id, ingredients)?;
    }

    tx.commit().map_err(DbError::from)?;

    info!(recipe_id = id, "updated recipe");
    Ok(detail(&conn, Some(user), recipe)?)
}

pub fn delete_recipe(db: &Database, user: RequestUser, id: i64) -> AppResult<()> {
    let conn = db.get_conn()?;
    let existing = load_recipe(&conn, id)?;
    ensure_author(user, &existing)?;

    Recipe::delete(&conn, id)?;
    info!(recipe_id = id, "deleted recipe");
    Ok(())
}
