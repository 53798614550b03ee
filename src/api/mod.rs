//! API handlers for Bookshelf REST endpoints

pub mod books;
pub mod favorites;
pub mod health;
pub mod openapi;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use crate::{error::AppError, AppState};

/// Header carrying the caller's user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor for the user a favorites request acts on.
///
/// Reads `X-User-Id` and falls back to the configured default user.
pub struct CurrentUser(pub i64);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(CurrentUser(state.config.favorites.default_user_id));
        };

        let user_id = value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| AppError::InvalidArgument("Invalid X-User-Id header".to_string()))?;

        Ok(CurrentUser(user_id))
    }
}
