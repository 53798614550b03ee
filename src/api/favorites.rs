//! Favorite endpoints for the current user

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{favorite::AddFavorite, AddOutcome, Book, RemoveOutcome},
};

use super::CurrentUser;

#[derive(Serialize, ToSchema)]
pub struct FavoriteCheckResponse {
    /// Whether the book is in the user's favorites
    pub favorite: bool,
}

/// List the current user's favorite books, most recent first
#[utoipa::path(
    get,
    path = "/favorites",
    tag = "favorites",
    params(
        ("X-User-Id" = Option<i64>, Header, description = "User ID (defaults to the configured user)")
    ),
    responses(
        (status = 200, description = "Favorite books", body = Vec<Book>)
    )
)]
pub async fn list_favorites(
    State(state): State<crate::AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.favorites.list_favorites(user_id).await?;
    Ok(Json(books))
}

/// Add a book to the current user's favorites
#[utoipa::path(
    post,
    path = "/favorites",
    tag = "favorites",
    params(
        ("X-User-Id" = Option<i64>, Header, description = "User ID (defaults to the configured user)")
    ),
    request_body = AddFavorite,
    responses(
        (status = 201, description = "Favorite added"),
        (status = 400, description = "Invalid ID", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book is already in favorites", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_favorite(
    State(state): State<crate::AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<AddFavorite>,
) -> AppResult<StatusCode> {
    match state.services.favorites.add_favorite(user_id, request.book_id).await? {
        AddOutcome::Added => Ok(StatusCode::CREATED),
        AddOutcome::AlreadyFavorited => Err(AppError::Conflict("Book is already in favorites".to_string())),
    }
}

/// Remove a book from the current user's favorites
#[utoipa::path(
    delete,
    path = "/favorites/{book_id}",
    tag = "favorites",
    params(
        ("book_id" = i64, Path, description = "Book ID"),
        ("X-User-Id" = Option<i64>, Header, description = "User ID (defaults to the configured user)")
    ),
    responses(
        (status = 204, description = "Favorite removed"),
        (status = 400, description = "Invalid ID", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book is not in favorites", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_favorite(
    State(state): State<crate::AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(book_id): Path<i64>,
) -> AppResult<StatusCode> {
    match state.services.favorites.remove_favorite(user_id, book_id).await? {
        RemoveOutcome::Removed => Ok(StatusCode::NO_CONTENT),
        RemoveOutcome::NotFavorited => Err(AppError::Conflict("Book is not in favorites".to_string())),
    }
}

/// Check whether a book is in the current user's favorites
#[utoipa::path(
    get,
    path = "/favorites/check/{book_id}",
    tag = "favorites",
    params(
        ("book_id" = i64, Path, description = "Book ID"),
        ("X-User-Id" = Option<i64>, Header, description = "User ID (defaults to the configured user)")
    ),
    responses(
        (status = 200, description = "Favorite status", body = FavoriteCheckResponse)
    )
)]
pub async fn check_favorite(
    State(state): State<crate::AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(book_id): Path<i64>,
) -> AppResult<Json<FavoriteCheckResponse>> {
    let favorite = state.services.favorites.is_favorite(user_id, book_id).await?;
    Ok(Json(FavoriteCheckResponse { favorite }))
}
