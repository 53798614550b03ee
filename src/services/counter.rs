//! Favorite counter synchronizer
//!
//! Owns every write to `Book::favorite_count`. The counter is clamped to
//! `[0, MAX_FAVORITE_COUNT]` and is never recomputed from the favorites table,
//! so once the ceiling is reached it may trail the real number of favorites.

use crate::{
    error::{AppError, AppResult},
    models::{book::MAX_FAVORITE_COUNT, Book},
    repository::{CatalogTx, Repository},
};

/// Accepted counter adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterChange {
    Incremented(i32),
    Decremented(i32),
    /// A missing counter was initialized to zero
    Normalized,
    /// Already zero, nothing written
    AtFloor,
    /// Already at the ceiling, nothing written
    AtCeiling,
}

#[derive(Clone)]
pub struct FavoriteCounter {
    repository: Repository,
}

impl FavoriteCounter {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Increment a book's counter in its own transaction.
    ///
    /// Returns `Ok(false)` without writing when the id is invalid, the book
    /// does not exist or the counter is at the ceiling.
    pub async fn increment(&self, book_id: i64) -> AppResult<bool> {
        let mut tx = self.repository.begin().await?;
        let result = self.increment_in(tx.as_mut(), book_id).await;
        match result {
            Ok(_) => {
                tx.commit().await?;
                Ok(true)
            }
            Err(e) if e.is_refusal() => {
                tracing::warn!("Favorite count increment refused for book {}: {}", book_id, e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Decrement a book's counter in its own transaction.
    ///
    /// A missing counter is written as zero and a zero counter is left alone;
    /// both report `Ok(true)`.
    pub async fn decrement(&self, book_id: i64) -> AppResult<bool> {
        let mut tx = self.repository.begin().await?;
        let result = self.decrement_in(tx.as_mut(), book_id).await;
        match result {
            Ok(_) => {
                tx.commit().await?;
                Ok(true)
            }
            Err(e) if e.is_refusal() => {
                tracing::warn!("Favorite count decrement refused for book {}: {}", book_id, e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Increment inside a caller-owned transaction
    pub async fn increment_in(&self, tx: &mut dyn CatalogTx, book_id: i64) -> AppResult<CounterChange> {
        let mut book = load_book(tx, book_id).await?;
        let current = book.favorite_count_or_zero();

        if current >= MAX_FAVORITE_COUNT {
            return Err(AppError::CapacityExceeded(format!(
                "Book {} already has the maximum of {} favorites",
                book_id, MAX_FAVORITE_COUNT
            )));
        }

        book.favorite_count = Some(current + 1);
        store_book(tx, &book).await?;
        Ok(CounterChange::Incremented(current + 1))
    }

    /// Decrement inside a caller-owned transaction
    pub async fn decrement_in(&self, tx: &mut dyn CatalogTx, book_id: i64) -> AppResult<CounterChange> {
        let mut book = load_book(tx, book_id).await?;

        match book.favorite_count {
            None => {
                book.favorite_count = Some(0);
                store_book(tx, &book).await?;
                Ok(CounterChange::Normalized)
            }
            Some(count) if count > 0 => {
                book.favorite_count = Some(count - 1);
                store_book(tx, &book).await?;
                Ok(CounterChange::Decremented(count - 1))
            }
            Some(_) => Ok(CounterChange::AtFloor),
        }
    }
}

async fn load_book(tx: &mut dyn CatalogTx, book_id: i64) -> AppResult<Book> {
    if book_id <= 0 {
        return Err(AppError::InvalidArgument(format!("Invalid book id {}", book_id)));
    }
    tx.get_book(book_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))
}

async fn store_book(tx: &mut dyn CatalogTx, book: &Book) -> AppResult<()> {
    if !tx.save_book(book).await? {
        return Err(AppError::NotFound(format!("Book with id {} not found", book.id)));
    }
    Ok(())
}
