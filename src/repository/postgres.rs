//! PostgreSQL catalog store

use async_trait::async_trait;
use sqlx::{PgConnection, Pool, Postgres, Transaction};

use super::{CatalogStore, CatalogTx};
use crate::{
    error::{AppError, AppResult},
    models::{Book, Favorite, NewBook, NewFavorite},
};

const BOOK_COLUMNS: &str = "id, name, author, category, price, description, favorite_count, create_time, update_time";

#[derive(Clone)]
pub struct PgCatalogStore {
    pool: Pool<Postgres>,
}

impl PgCatalogStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn begin(&self) -> AppResult<Box<dyn CatalogTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgCatalogTx { tx: Some(tx) }))
    }

    async fn get_book(&self, id: i64) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn get_books(&self, ids: &[i64]) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books WHERE id = ANY($1)", BOOK_COLUMNS))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn list_all_books(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books ORDER BY id", BOOK_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn get_favorite(&self, user_id: i64, book_id: i64) -> AppResult<Option<Favorite>> {
        let favorite = sqlx::query_as::<_, Favorite>(
            "SELECT id, user_id, book_id, create_time FROM favorites WHERE user_id = $1 AND book_id = $2 LIMIT 1",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(favorite)
    }

    async fn list_favorites_for_user(&self, user_id: i64) -> AppResult<Vec<Favorite>> {
        let favorites = sqlx::query_as::<_, Favorite>(
            r#"
            SELECT id, user_id, book_id, create_time
            FROM favorites
            WHERE user_id = $1
            ORDER BY create_time DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(favorites)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Transaction over a pooled connection; rolled back on drop unless committed
pub struct PgCatalogTx {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgCatalogTx {
    fn conn(&mut self) -> AppResult<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| AppError::Store("Transaction already committed".to_string()))
    }
}

#[async_trait]
impl CatalogTx for PgCatalogTx {
    async fn get_book(&mut self, id: i64) -> AppResult<Option<Book>> {
        // Row lock serializes concurrent favorite changes on the same book
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE id = $1 FOR UPDATE",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(book)
    }

    async fn insert_book(&mut self, book: &NewBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (name, author, category, price, description, favorite_count, create_time, update_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&book.name)
        .bind(&book.author)
        .bind(&book.category)
        .bind(book.price)
        .bind(&book.description)
        .bind(book.favorite_count)
        .bind(book.create_time)
        .bind(book.update_time)
        .fetch_one(self.conn()?)
        .await?;
        Ok(created)
    }

    async fn save_book(&mut self, book: &Book) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET name = $1, author = $2, category = $3, price = $4, description = $5,
                favorite_count = $6, update_time = $7
            WHERE id = $8
            "#,
        )
        .bind(&book.name)
        .bind(&book.author)
        .bind(&book.category)
        .bind(book.price)
        .bind(&book.description)
        .bind(book.favorite_count)
        .bind(book.update_time)
        .bind(book.id)
        .execute(self.conn()?)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_book(&mut self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_favorite(&mut self, user_id: i64, book_id: i64) -> AppResult<Option<Favorite>> {
        let favorite = sqlx::query_as::<_, Favorite>(
            "SELECT id, user_id, book_id, create_time FROM favorites WHERE user_id = $1 AND book_id = $2 LIMIT 1",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(favorite)
    }

    async fn insert_favorite(&mut self, favorite: &NewFavorite) -> AppResult<Favorite> {
        let created = sqlx::query_as::<_, Favorite>(
            r#"
            INSERT INTO favorites (user_id, book_id, create_time)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, book_id, create_time
            "#,
        )
        .bind(favorite.user_id)
        .bind(favorite.book_id)
        .bind(favorite.create_time)
        .fetch_one(self.conn()?)
        .await?;
        Ok(created)
    }

    async fn delete_favorite(&mut self, user_id: i64, book_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND book_id = $2")
            .bind(user_id)
            .bind(book_id)
            .execute(self.conn()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_favorites_for_book(&mut self, book_id: i64) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM favorites WHERE book_id = $1")
            .bind(book_id)
            .execute(self.conn()?)
            .await?;
        Ok(result.rows_affected())
    }

    async fn commit(&mut self) -> AppResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| AppError::Store("Transaction already committed".to_string()))?;
        tx.commit().await?;
        Ok(())
    }
}
