//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;
use tracing::info;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        info!(version = 1, "applied schema migration");
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- USERS
        -- ============================================
        CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            username TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Populated by the external auth service
        CREATE TABLE auth_tokens (
            key TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_auth_tokens_user ON auth_tokens(user_id);

        -- ============================================
        -- TAGS
        -- ============================================
        CREATE TABLE tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            color TEXT NOT NULL UNIQUE,
            slug TEXT NOT NULL UNIQUE
        );

        -- ============================================
        -- INGREDIENTS
        -- Reference data, identity is (name, measurement_unit)
        -- ============================================
        CREATE TABLE ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            measurement_unit TEXT NOT NULL,

            UNIQUE(name, measurement_unit)
        );

        CREATE INDEX idx_ingredients_name ON ingredients(name);

        -- ============================================
        -- RECIPES
        -- ============================================
        CREATE TABLE recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL UNIQUE,
            image TEXT NOT NULL DEFAULT '',
            text TEXT NOT NULL DEFAULT '',
            cooking_time INTEGER NOT NULL CHECK(cooking_time >= 1),
            pub_date TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now'))
        );

        CREATE INDEX idx_recipes_author ON recipes(author_id);
        CREATE INDEX idx_recipes_pub_date ON recipes(pub_date);

        CREATE TABLE recipe_tags (
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,

            PRIMARY KEY (recipe_id, tag_id)
        );

        CREATE INDEX idx_recipe_tags_tag ON recipe_tags(tag_id);

        -- ============================================
        -- RECIPE INGREDIENTS
        -- Junction table: which ingredients in which recipes
        -- ============================================
        CREATE TABLE recipe_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE RESTRICT,
            amount INTEGER NOT NULL CHECK(amount BETWEEN 1 AND 32767),

            UNIQUE(recipe_id, ingredient_id)     -- one line per ingredient per recipe
        );

        CREATE INDEX idx_recipe_ingredients_recipe ON recipe_ingredients(recipe_id);
        CREATE INDEX idx_recipe_ingredients_ingredient ON recipe_ingredients(ingredient_id);

        -- ============================================
        -- FAVORITES / SHOPPING CART
        -- Same shape, one row per (user, recipe)
        -- ============================================
        CREATE TABLE favorites (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(user_id, recipe_id)
        );

        CREATE TABLE shopping_cart (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(user_id, recipe_id)
        );

        CREATE INDEX idx_favorites_recipe ON favorites(recipe_id);
        CREATE INDEX idx_shopping_cart_recipe ON shopping_cart(recipe_id);

        -- ============================================
        -- SUBSCRIPTIONS
        -- ============================================
        CREATE TABLE subscriptions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(user_id, author_id),
            CHECK(user_id <> author_id)
        );

        CREATE INDEX idx_subscriptions_author ON subscriptions(author_id);
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_schema_version_error_is_reported() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(get_schema_version(&conn).is_err());
    }

    #[test]
    fn test_amount_bounds_enforced_by_schema() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO users (email, username, password_hash) VALUES ('a@x.io', 'a', 'h');
             INSERT INTO ingredients (name, measurement_unit) VALUES ('flour', 'g');
             INSERT INTO recipes (author_id, name, cooking_time) VALUES (1, 'Bread', 60);",
        )
        .unwrap();

        let insert = |amount: i64| {
            conn.execute(
                "INSERT OR REPLACE INTO recipe_ingredients (recipe_id, ingredient_id, amount)
                 VALUES (1, 1, ?1)",
                [amount],
            )
        };
        assert!(insert(32_767).is_ok());
        assert!(insert(32_768).is_err());
        assert!(insert(i64::MAX).is_err());
    }
}
