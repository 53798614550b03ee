//! Favorite model: one (user, book) membership row

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Favorite record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Favorite {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub create_time: DateTime<Utc>,
}

/// A favorite about to be inserted; the store assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewFavorite {
    pub user_id: i64,
    pub book_id: i64,
    pub create_time: DateTime<Utc>,
}

impl NewFavorite {
    pub fn new(user_id: i64, book_id: i64) -> Self {
        Self {
            user_id,
            book_id,
            create_time: Utc::now(),
        }
    }
}

/// Add favorite request
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddFavorite {
    pub book_id: i64,
}

/// Result of adding a favorite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AddOutcome {
    Added,
    AlreadyFavorited,
}

/// Result of removing a favorite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RemoveOutcome {
    Removed,
    NotFavorited,
}
