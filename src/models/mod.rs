//! Data models
//!
//! Rust structs representing database entities.

mod auth_token;
mod ingredient;
mod recipe;
mod recipe_ingredient;
mod subscription;
mod tag;
mod user;
mod user_recipe;

pub use auth_token::AuthToken;
pub use ingredient::{Ingredient, IngredientCreate, IngredientUpdate};
pub use recipe::{IngredientAmount, Recipe, RecipeCreate, RecipeFilter, RecipeUpdate, MAX_AMOUNT};
pub use recipe_ingredient::{CartLine, RecipeIngredient};
pub use subscription::Subscription;
pub use tag::{normalize_color, Tag, TagCreate, TagUpdate};
pub use user::{validate_password, User, UserCreate, UserUpdate, MIN_PASSWORD_LEN};
pub use user_recipe::RecipeList;

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern
pub(crate) fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
