//! In-process catalog store
//!
//! A transaction holds the store lock for its whole lifetime and works on a
//! private copy of the state, which replaces the shared state on commit.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{CatalogStore, CatalogTx};
use crate::{
    error::{AppError, AppResult},
    models::{Book, Favorite, NewBook, NewFavorite},
};

#[derive(Debug, Default, Clone)]
struct MemoryState {
    books: BTreeMap<i64, Book>,
    favorites: Vec<Favorite>,
    last_book_id: i64,
    last_favorite_id: i64,
}

impl MemoryState {
    fn find_favorite(&self, user_id: i64, book_id: i64) -> Option<&Favorite> {
        self.favorites
            .iter()
            .find(|f| f.user_id == user_id && f.book_id == book_id)
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_book_saves: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a book directly, bypassing catalog validation
    pub async fn seed_book(&self, book: NewBook) -> Book {
        let mut state = self.state.lock().await;
        insert_book(&mut state, &book)
    }

    /// Number of favorite rows for a (user, book) pair
    pub async fn favorite_rows(&self, user_id: i64, book_id: i64) -> usize {
        let state = self.state.lock().await;
        state
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id && f.book_id == book_id)
            .count()
    }

    /// Make every subsequent `save_book` fail with a store error
    pub fn set_fail_book_saves(&self, fail: bool) {
        self.fail_book_saves.store(fail, Ordering::SeqCst);
    }
}

fn insert_book(state: &mut MemoryState, book: &NewBook) -> Book {
    state.last_book_id += 1;
    let created = Book {
        id: state.last_book_id,
        name: book.name.clone(),
        author: book.author.clone(),
        category: book.category.clone(),
        price: book.price,
        description: book.description.clone(),
        favorite_count: book.favorite_count,
        create_time: Some(book.create_time),
        update_time: Some(book.update_time),
    };
    state.books.insert(created.id, created.clone());
    created
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn CatalogTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx {
            guard: Some(guard),
            working,
            fail_book_saves: self.fail_book_saves.clone(),
        }))
    }

    async fn get_book(&self, id: i64) -> AppResult<Option<Book>> {
        Ok(self.state.lock().await.books.get(&id).cloned())
    }

    async fn get_books(&self, ids: &[i64]) -> AppResult<Vec<Book>> {
        let state = self.state.lock().await;
        Ok(ids.iter().filter_map(|id| state.books.get(id).cloned()).collect())
    }

    async fn list_all_books(&self) -> AppResult<Vec<Book>> {
        Ok(self.state.lock().await.books.values().cloned().collect())
    }

    async fn get_favorite(&self, user_id: i64, book_id: i64) -> AppResult<Option<Favorite>> {
        Ok(self.state.lock().await.find_favorite(user_id, book_id).cloned())
    }

    async fn list_favorites_for_user(&self, user_id: i64) -> AppResult<Vec<Favorite>> {
        let state = self.state.lock().await;
        let mut favorites: Vec<Favorite> = state
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        favorites.sort_by(|a, b| b.create_time.cmp(&a.create_time).then(b.id.cmp(&a.id)));
        Ok(favorites)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

pub struct MemoryTx {
    guard: Option<OwnedMutexGuard<MemoryState>>,
    working: MemoryState,
    fail_book_saves: Arc<AtomicBool>,
}

#[async_trait]
impl CatalogTx for MemoryTx {
    async fn get_book(&mut self, id: i64) -> AppResult<Option<Book>> {
        Ok(self.working.books.get(&id).cloned())
    }

    async fn insert_book(&mut self, book: &NewBook) -> AppResult<Book> {
        Ok(insert_book(&mut self.working, book))
    }

    async fn save_book(&mut self, book: &Book) -> AppResult<bool> {
        if self.fail_book_saves.load(Ordering::SeqCst) {
            return Err(AppError::Store(format!("Failed to save book {}", book.id)));
        }
        match self.working.books.get_mut(&book.id) {
            Some(existing) => {
                *existing = book.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_book(&mut self, id: i64) -> AppResult<bool> {
        Ok(self.working.books.remove(&id).is_some())
    }

    async fn get_favorite(&mut self, user_id: i64, book_id: i64) -> AppResult<Option<Favorite>> {
        Ok(self.working.find_favorite(user_id, book_id).cloned())
    }

    async fn insert_favorite(&mut self, favorite: &NewFavorite) -> AppResult<Favorite> {
        self.working.last_favorite_id += 1;
        let created = Favorite {
            id: self.working.last_favorite_id,
            user_id: favorite.user_id,
            book_id: favorite.book_id,
            create_time: favorite.create_time,
        };
        self.working.favorites.push(created.clone());
        Ok(created)
    }

    async fn delete_favorite(&mut self, user_id: i64, book_id: i64) -> AppResult<bool> {
        let before = self.working.favorites.len();
        self.working
            .favorites
            .retain(|f| !(f.user_id == user_id && f.book_id == book_id));
        Ok(self.working.favorites.len() < before)
    }

    async fn delete_favorites_for_book(&mut self, book_id: i64) -> AppResult<u64> {
        let before = self.working.favorites.len();
        self.working.favorites.retain(|f| f.book_id != book_id);
        Ok((before - self.working.favorites.len()) as u64)
    }

    async fn commit(&mut self) -> AppResult<()> {
        let mut guard = self
            .guard
            .take()
            .ok_or_else(|| AppError::Store("Transaction already committed".to_string()))?;
        *guard = std::mem::take(&mut self.working);
        Ok(())
    }
}
