//! Request authentication
//!
//! Resolves `Authorization: Token <key>` (or `Bearer <key>`) against the
//! `auth_tokens` table.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

use super::{run_blocking, AppState};
use crate::error::{AppError, AppResult};
use crate::services::{users, RequestUser};

/// Caller that must be authenticated
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub RequestUser);

/// Caller that may be anonymous; a present but unknown token is still rejected
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<RequestUser>);

/// Pull the token key out of the header, if any
fn token_from_parts(parts: &Parts) -> AppResult<Option<String>> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::auth_invalid("Malformed Authorization header"))?;

    let (scheme, key) = value
        .trim()
        .split_once(' ')
        .ok_or_else(|| AppError::auth_invalid("Malformed Authorization header"))?;
    let key = key.trim();
    if key.is_empty()
        || !(scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer"))
    {
        return Err(AppError::auth_invalid("Malformed Authorization header"));
    }
    Ok(Some(key.to_string()))
}

async fn resolve(parts: &Parts, state: &AppState) -> AppResult<Option<RequestUser>> {
    match token_from_parts(parts)? {
        Some(key) => {
            let user = run_blocking(&state.db, move |db| users::authenticate_token(&db, &key)).await?;
            debug!(user_id = user.id, "authenticated request");
            Ok(Some(user))
        }
        None => Ok(None),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .await?
            .map(CurrentUser)
            .ok_or_else(AppError::auth_required)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve(parts, state).await?))
    }
}
