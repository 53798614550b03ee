//! Repository layer: the catalog store adapter
//!
//! Services talk to storage only through [`CatalogStore`] (point reads and
//! listings) and [`CatalogTx`] (everything that mutates). A transaction that is
//! dropped without [`CatalogTx::commit`] discards all of its changes.

pub mod memory;
pub mod postgres;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Book, Favorite, NewBook, NewFavorite},
};

/// Read access and transaction factory for books and favorites
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Open a transaction covering book and favorite mutations
    async fn begin(&self) -> AppResult<Box<dyn CatalogTx>>;

    async fn get_book(&self, id: i64) -> AppResult<Option<Book>>;

    /// Books with any of the given ids, in no particular order; unknown ids are skipped
    async fn get_books(&self, ids: &[i64]) -> AppResult<Vec<Book>>;

    async fn list_all_books(&self) -> AppResult<Vec<Book>>;

    async fn get_favorite(&self, user_id: i64, book_id: i64) -> AppResult<Option<Favorite>>;

    /// Favorites of a user, most recently created first
    async fn list_favorites_for_user(&self, user_id: i64) -> AppResult<Vec<Favorite>>;

    /// Check that the store is reachable
    async fn ping(&self) -> AppResult<()>;
}

/// A unit of work against the store
#[async_trait]
pub trait CatalogTx: Send {
    /// Load a book and hold it for the rest of the transaction
    async fn get_book(&mut self, id: i64) -> AppResult<Option<Book>>;

    async fn insert_book(&mut self, book: &NewBook) -> AppResult<Book>;

    /// Persist every column of `book`; false when no row has its id
    async fn save_book(&mut self, book: &Book) -> AppResult<bool>;

    async fn delete_book(&mut self, id: i64) -> AppResult<bool>;

    async fn get_favorite(&mut self, user_id: i64, book_id: i64) -> AppResult<Option<Favorite>>;

    async fn insert_favorite(&mut self, favorite: &NewFavorite) -> AppResult<Favorite>;

    /// Delete the (user, book) row; false when there was none
    async fn delete_favorite(&mut self, user_id: i64, book_id: i64) -> AppResult<bool>;

    /// Delete every favorite pointing at a book, returning how many went
    async fn delete_favorites_for_book(&mut self, book_id: i64) -> AppResult<u64>;

    async fn commit(&mut self) -> AppResult<()>;
}

/// Shared handle on the configured catalog store
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn CatalogStore>,
}

impl Repository {
    /// Create a repository backed by PostgreSQL
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self::from_store(Arc::new(postgres::PgCatalogStore::new(pool)))
    }

    /// Create a repository backed by an in-process store
    pub fn in_memory(store: memory::MemoryStore) -> Self {
        Self::from_store(Arc::new(store))
    }

    pub fn from_store(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }
}

impl Deref for Repository {
    type Target = dyn CatalogStore;

    fn deref(&self) -> &Self::Target {
        self.store.as_ref()
    }
}
