//! User services
//!
//! Registration, profile views and password changes. Token issuance belongs to
//! the external auth service; [`authenticate_token`] only resolves keys.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{conflict_or_db, Page, PageRequest, RequestUser};
use crate::db::{Database, DbResult};
use crate::error::{AppError, AppResult};
use crate::models::{validate_password, AuthToken, Subscription, User, UserCreate, UserUpdate};

/// Public view of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Whether the viewer follows this user; false for anonymous viewers
    pub is_subscribed: bool,
}

/// Payload for `set_password`
#[derive(Debug, Clone, Deserialize)]
pub struct SetPassword {
    pub current_password: String,
    pub new_password: String,
}

pub(crate) fn user_view(
    conn: &Connection,
    viewer: Option<RequestUser>,
    user: User,
) -> DbResult<UserView> {
    let is_subscribed = match viewer {
        Some(v) if v.id != user.id => Subscription::exists(conn, v.id, user.id)?,
        _ => false,
    };
    Ok(UserView {
        id: user.id,
        email: user.email,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        is_subscribed,
    })
}

fn hash_password(password: &str) -> AppResult<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::internal(format!("password hashing failed: {}", e)))
}

/// Register a new account
pub fn register(db: &Database, mut data: UserCreate) -> AppResult<UserView> {
    data.validate().map_err(AppError::invalid_input)?;
    let password_hash = hash_password(&data.password)?;

    let conn = db.get_conn()?;
    let user = User::create(&conn, &data, &password_hash).map_err(|e| {
        conflict_or_db(e, "A user with that email or username already exists")
    })?;

    info!(user_id = user.id, username = %user.username, "registered user");
    Ok(user_view(&conn, None, user)?)
}

pub fn list_users(
    db: &Database,
    viewer: Option<RequestUser>,
    search: Option<&str>,
    page: PageRequest,
    default_limit: u32,
) -> AppResult<Page<UserView>> {
    let pagination = page.resolve(default_limit)?;
    let search = search.map(str::trim).filter(|s| !s.is_empty());

    let conn = db.get_conn()?;
    let count = User::count(&conn, search)?;
    pagination.check(count)?;

    let users = User::list(&conn, search, pagination.limit(), pagination.offset())?;
    let views = users
        .into_iter()
        .map(|u| user_view(&conn, viewer, u))
        .collect::<DbResult<Vec<_>>>()?;
    Ok(pagination.wrap(count, views))
}

pub fn get_user(db: &Database, viewer: Option<RequestUser>, id: i64) -> AppResult<UserView> {
    let conn = db.get_conn()?;
    let user = User::get_by_id(&conn, id)?.ok_or_else(|| AppError::not_found(format!("User {}", id)))?;
    Ok(user_view(&conn, viewer, user)?)
}

pub fn me(db: &Database, user: RequestUser) -> AppResult<UserView> {
    get_user(db, Some(user), user.id)
}

pub fn update_me(db: &Database, user: RequestUser, mut data: UserUpdate) -> AppResult<UserView> {
    data.validate().map_err(AppError::invalid_input)?;

    let conn = db.get_conn()?;
    let updated = User::update(&conn, user.id, &data)
        .map_err(|e| conflict_or_db(e, "A user with that email or username already exists"))?
        .ok_or_else(|| AppError::not_found(format!("User {}", user.id)))?;

    debug!(user_id = user.id, "updated profile");
    Ok(user_view(&conn, Some(user), updated)?)
}

pub fn set_password(db: &Database, user: RequestUser, data: SetPassword) -> AppResult<()> {
    let conn = db.get_conn()?;
    let current = User::get_by_id(&conn, user.id)?
        .ok_or_else(|| AppError::not_found(format!("User {}", user.id)))?;

    let matches = bcrypt::verify(&data.current_password, &current.password_hash)
        .map_err(|e| AppError::internal(format!("password check failed: {}", e)))?;
    if !matches {
        warn!(user_id = user.id, "password change with wrong current password");
        return Err(AppError::invalid_input("Current password is incorrect"));
    }
    validate_password(&data.new_password).map_err(AppError::invalid_input)?;

    let password_hash = hash_password(&data.new_password)?;
    User::set_password_hash(&conn, user.id, &password_hash)?;
    info!(user_id = user.id, "password changed");
    Ok(())
}

/// Resolve a token key to its owner
pub fn authenticate_token(db: &Database, key: &str) -> AppResult<RequestUser> {
    let conn = db.get_conn()?;
    match AuthToken::user_id_for_key(&conn, key)? {
        Some(id) => Ok(RequestUser::new(id)),
        None => Err(AppError::auth_invalid("Invalid token")),
    }
}

/// Resolve a username or email to a user, for surfaces without tokens
pub fn resolve_login(db: &Database, login: &str) -> AppResult<RequestUser> {
    let conn = db.get_conn()?;
    User::find_by_login(&conn, login.trim())?
        .map(|u| RequestUser::new(u.id))
        .ok_or_else(|| AppError::not_found(format!("User '{}'", login.trim())))
}
