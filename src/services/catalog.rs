//! Catalog management service

use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{Book, CreateBook, NewBook, UpdateBook},
    repository::Repository,
};

use super::query::{self, SortDirection};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

fn check_book_id(id: i64) -> AppResult<()> {
    if id <= 0 {
        return Err(AppError::InvalidArgument(format!("Invalid book id {}", id)));
    }
    Ok(())
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books by name, author or category, newest update first
    pub async fn search_catalog(&self, query: Option<&str>) -> AppResult<Vec<Book>> {
        let books = self.repository.list_all_books().await?;
        let total = books.len();
        let found = query::search(books, query.unwrap_or_default());
        tracing::debug!("Catalog search {:?}: {} of {} books", query, found.len(), total);
        Ok(found)
    }

    /// Search books by name, author, category or description, ordered by
    /// favorite count. `sort_type` other than `asc` sorts descending.
    pub async fn search_catalog_sorted(&self, query: Option<&str>, sort_type: &str) -> AppResult<Vec<Book>> {
        let direction = SortDirection::parse(sort_type);
        let books = self.repository.list_all_books().await?;
        let found = query::search_and_sort(books, query.unwrap_or_default(), direction);
        tracing::debug!("Catalog sorted search {:?} ({:?}): {} books", query, direction, found.len());
        Ok(found)
    }

    /// Get a book with display defaults filled in
    pub async fn get_book_detail(&self, id: i64) -> AppResult<Book> {
        check_book_id(id)?;
        self.repository
            .get_book(id)
            .await?
            .map(Book::normalized)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Create a book with a zero favorite count
    pub async fn create_book(&self, data: CreateBook) -> AppResult<Book> {
        data.validate()?;

        let mut tx = self.repository.begin().await?;
        let book = tx.insert_book(&NewBook::from(data)).await?;
        tx.commit().await?;

        tracing::info!("Created book {} ({})", book.id, book.name);
        Ok(book)
    }

    /// Update the descriptive fields of a book; the favorite count is kept
    pub async fn update_book(&self, id: i64, data: UpdateBook) -> AppResult<Book> {
        check_book_id(id)?;
        data.validate()?;

        let mut tx = self.repository.begin().await?;
        let mut book = tx
            .get_book(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        data.apply_to(&mut book);
        book.update_time = Some(Utc::now());

        if !tx.save_book(&book).await? {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        tx.commit().await?;

        tracing::info!("Updated book {}", id);
        Ok(book)
    }

    /// Delete a book together with every favorite pointing at it
    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        check_book_id(id)?;

        let mut tx = self.repository.begin().await?;
        if tx.get_book(id).await?.is_none() {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        let removed = tx.delete_favorites_for_book(id).await?;
        tx.delete_book(id).await?;
        tx.commit().await?;

        tracing::info!("Deleted book {} and {} favorite(s)", id, removed);
        Ok(())
    }

    /// Check that the catalog store answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
