//! Favorite ledger: the authoritative set of (user, book) favorites
//!
//! Adding and removing a favorite always runs in one store transaction that
//! also moves the book's favorite counter. If the counter fails, the favorite
//! row change is rolled back with it. A counter already at its ceiling does not
//! block an add: the row is kept and the counter trails the ledger from then on.

use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult, ErrorKind},
    models::{AddOutcome, Book, NewFavorite, RemoveOutcome},
    repository::Repository,
};

use super::counter::{CounterChange, FavoriteCounter};

#[derive(Clone)]
pub struct FavoritesService {
    repository: Repository,
    counter: FavoriteCounter,
}

fn check_ids(user_id: i64, book_id: i64) -> AppResult<()> {
    if user_id <= 0 {
        return Err(AppError::InvalidArgument(format!("Invalid user id {}", user_id)));
    }
    if book_id <= 0 {
        return Err(AppError::InvalidArgument(format!("Invalid book id {}", book_id)));
    }
    Ok(())
}

impl FavoritesService {
    pub fn new(repository: Repository, counter: FavoriteCounter) -> Self {
        Self { repository, counter }
    }

    /// Whether the user currently has the book in favorites
    pub async fn is_favorite(&self, user_id: i64, book_id: i64) -> AppResult<bool> {
        if check_ids(user_id, book_id).is_err() {
            return Ok(false);
        }
        Ok(self.repository.get_favorite(user_id, book_id).await?.is_some())
    }

    /// Add a book to a user's favorites and increment its counter
    pub async fn add_favorite(&self, user_id: i64, book_id: i64) -> AppResult<AddOutcome> {
        check_ids(user_id, book_id)?;

        let mut tx = self.repository.begin().await?;

        // Taking the book first makes concurrent adds of the same pair queue
        // behind each other, so the existence check below cannot go stale.
        tx.get_book(book_id).await?;

        if tx.get_favorite(user_id, book_id).await?.is_some() {
            tracing::debug!("User {} already has book {} in favorites", user_id, book_id);
            return Ok(AddOutcome::AlreadyFavorited);
        }

        tx.insert_favorite(&NewFavorite::new(user_id, book_id)).await?;
        let change = match self.counter.increment_in(tx.as_mut(), book_id).await {
            Ok(change) => change,
            Err(e) if e.kind() == ErrorKind::CapacityExceeded => {
                tracing::warn!("Book {} favorite count not incremented: {}", book_id, e);
                CounterChange::AtCeiling
            }
            Err(e) => return Err(e),
        };
        tx.commit().await?;

        tracing::info!("User {} added book {} to favorites ({:?})", user_id, book_id, change);
        Ok(AddOutcome::Added)
    }

    /// Remove a book from a user's favorites and decrement its counter
    pub async fn remove_favorite(&self, user_id: i64, book_id: i64) -> AppResult<RemoveOutcome> {
        check_ids(user_id, book_id)?;

        let mut tx = self.repository.begin().await?;
        tx.get_book(book_id).await?;

        if !tx.delete_favorite(user_id, book_id).await? {
            return Ok(RemoveOutcome::NotFavorited);
        }

        // A row left behind by a deleted book is still removed
        let change = match self.counter.decrement_in(tx.as_mut(), book_id).await {
            Ok(change) => Some(change),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("Removing favorite of missing book {} for user {}", book_id, user_id);
                None
            }
            Err(e) => return Err(e),
        };
        tx.commit().await?;

        tracing::info!("User {} removed book {} from favorites ({:?})", user_id, book_id, change);
        Ok(RemoveOutcome::Removed)
    }

    /// A user's favorite books, most recently favorited first.
    /// Favorites whose book no longer exists are skipped.
    pub async fn list_favorites(&self, user_id: i64) -> AppResult<Vec<Book>> {
        let favorites = self.repository.list_favorites_for_user(user_id).await?;
        let ids: Vec<i64> = favorites.iter().map(|f| f.book_id).collect();

        let mut found: HashMap<i64, Book> = self
            .repository
            .get_books(&ids)
            .await?
            .into_iter()
            .map(|book| (book.id, book))
            .collect();

        let mut books = Vec::with_capacity(favorites.len());
        for favorite in favorites {
            match found.remove(&favorite.book_id) {
                Some(book) => books.push(book),
                None => tracing::warn!(
                    "Skipping favorite {} of user {}: book {} no longer exists",
                    favorite.id,
                    user_id,
                    favorite.book_id
                ),
            }
        }

        Ok(books)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::{
        models::{Favorite, NewBook},
        repository::{memory::MemoryStore, CatalogStore, MockCatalogStore},
    };
    use chrono::Utc;

    const USER: i64 = 1;

    fn new_book(name: &str, favorite_count: Option<i32>) -> NewBook {
        let now = Utc::now();
        NewBook {
            name: name.to_string(),
            author: Some("Author".to_string()),
            category: Some("Test".to_string()),
            price: None,
            description: Some("Description".to_string()),
            favorite_count,
            create_time: now,
            update_time: now,
        }
    }

    fn service(store: &MemoryStore) -> FavoritesService {
        let repository = Repository::in_memory(store.clone());
        FavoritesService::new(repository.clone(), FavoriteCounter::new(repository))
    }

    async fn count_of(store: &MemoryStore, id: i64) -> Option<i32> {
        store.get_book(id).await.unwrap().unwrap().favorite_count
    }

    #[tokio::test]
    async fn test_add_then_check() {
        let store = MemoryStore::new();
        let book = store.seed_book(new_book("Dune", Some(10))).await;
        let favorites = service(&store);

        assert_eq!(favorites.add_favorite(USER, book.id).await.unwrap(), AddOutcome::Added);
        assert!(favorites.is_favorite(USER, book.id).await.unwrap());
        assert_eq!(count_of(&store, book.id).await, Some(11));
    }

    #[tokio::test]
    async fn test_duplicate_add_is_refused_without_side_effects() {
        let store = MemoryStore::new();
        let book = store.seed_book(new_book("Dune", Some(10))).await;
        let favorites = service(&store);

        favorites.add_favorite(USER, book.id).await.unwrap();
        assert_eq!(
            favorites.add_favorite(USER, book.id).await.unwrap(),
            AddOutcome::AlreadyFavorited
        );
        assert_eq!(store.favorite_rows(USER, book.id).await, 1);
        assert_eq!(count_of(&store, book.id).await, Some(11));
    }

    #[tokio::test]
    async fn test_invalid_ids() {
        let store = MemoryStore::new();
        let book = store.seed_book(new_book("Dune", Some(0))).await;
        let favorites = service(&store);

        let err = favorites.add_favorite(-1, book.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = favorites.add_favorite(USER, -1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = favorites.remove_favorite(USER, 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(!favorites.is_favorite(0, book.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_add_missing_book_rolls_back() {
        let store = MemoryStore::new();
        let favorites = service(&store);

        let err = favorites.add_favorite(USER, 404).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(store.favorite_rows(USER, 404).await, 0);
    }

    #[tokio::test]
    async fn test_add_at_ceiling_keeps_row_and_count() {
        let store = MemoryStore::new();
        let book = store.seed_book(new_book("Popular", Some(1000))).await;
        let favorites = service(&store);

        assert_eq!(favorites.add_favorite(USER, book.id).await.unwrap(), AddOutcome::Added);
        assert!(favorites.is_favorite(USER, book.id).await.unwrap());
        assert_eq!(store.favorite_rows(USER, book.id).await, 1);
        assert_eq!(count_of(&store, book.id).await, Some(1000));

        // the counter trailed the ledger, so removal leaves it one lower
        assert_eq!(
            favorites.remove_favorite(USER, book.id).await.unwrap(),
            RemoveOutcome::Removed
        );
        assert!(!favorites.is_favorite(USER, book.id).await.unwrap());
        assert_eq!(count_of(&store, book.id).await, Some(999));
    }

    #[tokio::test]
    async fn test_store_failure_at_ceiling_rolls_back() {
        let store = MemoryStore::new();
        let book = store.seed_book(new_book("Popular", Some(1000))).await;
        let favorites = service(&store);

        // a removal that cannot persist the decrement keeps the row
        let mut tx = store.begin().await.unwrap();
        tx.insert_favorite(&NewFavorite::new(USER, book.id)).await.unwrap();
        tx.commit().await.unwrap();

        store.set_fail_book_saves(true);
        let err = favorites.remove_favorite(USER, book.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreFailure);
        store.set_fail_book_saves(false);

        assert_eq!(store.favorite_rows(USER, book.id).await, 1);
        assert_eq!(count_of(&store, book.id).await, Some(1000));
    }

    #[tokio::test]
    async fn test_remove_favorite_of_deleted_book() {
        let store = MemoryStore::new();
        let book = store.seed_book(new_book("Gone", Some(1))).await;
        let favorites = service(&store);

        let mut tx = store.begin().await.unwrap();
        tx.insert_favorite(&NewFavorite::new(USER, book.id)).await.unwrap();
        tx.delete_book(book.id).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(
            favorites.remove_favorite(USER, book.id).await.unwrap(),
            RemoveOutcome::Removed
        );
        assert!(!favorites.is_favorite(USER, book.id).await.unwrap());
        assert_eq!(store.favorite_rows(USER, book.id).await, 0);
    }

    #[tokio::test]
    async fn test_store_failure_rolls_back_favorite_row() {
        let store = MemoryStore::new();
        let book = store.seed_book(new_book("Dune", Some(2))).await;
        let favorites = service(&store);

        store.set_fail_book_saves(true);
        let err = favorites.add_favorite(USER, book.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreFailure);
        store.set_fail_book_saves(false);

        assert_eq!(store.favorite_rows(USER, book.id).await, 0);
        assert_eq!(count_of(&store, book.id).await, Some(2));
    }

    #[tokio::test]
    async fn test_add_remove_symmetry() {
        let store = MemoryStore::new();
        let book = store.seed_book(new_book("Dune", Some(41))).await;
        let favorites = service(&store);

        favorites.add_favorite(USER, book.id).await.unwrap();
        assert_eq!(
            favorites.remove_favorite(USER, book.id).await.unwrap(),
            RemoveOutcome::Removed
        );
        assert!(!favorites.is_favorite(USER, book.id).await.unwrap());
        assert_eq!(count_of(&store, book.id).await, Some(41));
    }

    #[tokio::test]
    async fn test_remove_not_favorited() {
        let store = MemoryStore::new();
        let book = store.seed_book(new_book("Dune", Some(3))).await;
        let favorites = service(&store);

        assert_eq!(
            favorites.remove_favorite(USER, book.id).await.unwrap(),
            RemoveOutcome::NotFavorited
        );
        assert_eq!(count_of(&store, book.id).await, Some(3));
    }

    #[tokio::test]
    async fn test_remove_keeps_counter_at_floor() {
        let store = MemoryStore::new();
        let book = store.seed_book(new_book("Drifted", Some(0))).await;
        let favorites = service(&store);

        let mut tx = store.begin().await.unwrap();
        tx.insert_favorite(&NewFavorite::new(USER, book.id)).await.unwrap();
        tx.commit().await.unwrap();

        favorites.remove_favorite(USER, book.id).await.unwrap();
        assert_eq!(count_of(&store, book.id).await, Some(0));
    }

    #[tokio::test]
    async fn test_list_most_recent_first() {
        let store = MemoryStore::new();
        let b1 = store.seed_book(new_book("B1", Some(0))).await;
        let b2 = store.seed_book(new_book("B2", Some(0))).await;
        let b3 = store.seed_book(new_book("B3", Some(0))).await;
        let favorites = service(&store);

        for book in [&b1, &b2, &b3] {
            favorites.add_favorite(USER, book.id).await.unwrap();
        }

        let names: Vec<String> = favorites
            .list_favorites(USER)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["B3", "B2", "B1"]);
    }

    #[tokio::test]
    async fn test_list_skips_deleted_books() {
        let store = MemoryStore::new();
        let kept = store.seed_book(new_book("Kept", Some(0))).await;
        let gone = store.seed_book(new_book("Gone", Some(0))).await;
        let favorites = service(&store);

        favorites.add_favorite(USER, kept.id).await.unwrap();
        favorites.add_favorite(USER, gone.id).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.delete_book(gone.id).await.unwrap();
        tx.commit().await.unwrap();

        let books = favorites.list_favorites(USER).await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, kept.id);
    }

    #[tokio::test]
    async fn test_list_resolves_books_in_one_read() {
        let now = Utc::now();
        let favorite = move |id: i64, book_id: i64| Favorite {
            id,
            user_id: USER,
            book_id,
            create_time: now,
        };
        let book = |id: i64| Book {
            id,
            name: format!("Book {}", id),
            author: None,
            category: None,
            price: None,
            description: None,
            favorite_count: Some(1),
            create_time: None,
            update_time: None,
        };

        let mut store = MockCatalogStore::new();
        store
            .expect_list_favorites_for_user()
            .returning(move |_| Ok(vec![favorite(3, 30), favorite(2, 20), favorite(1, 10)]));
        store
            .expect_get_books()
            .times(1)
            .returning(move |_| Ok(vec![book(10), book(30)]));
        store.expect_get_book().never();

        let repository = Repository::from_store(Arc::new(store));
        let favorites = FavoritesService::new(repository.clone(), FavoriteCounter::new(repository));

        let ids: Vec<i64> = favorites
            .list_favorites(USER)
            .await
            .unwrap()
            .iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec![30, 10]);
    }

    #[tokio::test]
    async fn test_concurrent_adds_produce_one_row() {
        let store = MemoryStore::new();
        let book = store.seed_book(new_book("Race", Some(0))).await;
        let favorites = service(&store);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let favorites = favorites.clone();
                let id = book.id;
                tokio::spawn(async move { favorites.add_favorite(USER, id).await })
            })
            .collect();

        let mut added = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() == AddOutcome::Added {
                added += 1;
            }
        }

        assert_eq!(added, 1);
        assert_eq!(store.favorite_rows(USER, book.id).await, 1);
        assert_eq!(count_of(&store, book.id).await, Some(1));
    }
}
