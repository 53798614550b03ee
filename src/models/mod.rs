//! Data models for Bookshelf

pub mod book;
pub mod favorite;

// Re-export commonly used types
pub use book::{Book, BookQuery, BookSortQuery, CreateBook, NewBook, UpdateBook};
pub use favorite::{AddOutcome, Favorite, NewFavorite, RemoveOutcome};
