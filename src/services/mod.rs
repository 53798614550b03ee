//! Business logic services

pub mod catalog;
pub mod counter;
pub mod favorites;
pub mod query;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub favorites: favorites::FavoritesService,
    pub counter: counter::FavoriteCounter,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        let counter = counter::FavoriteCounter::new(repository.clone());
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            favorites: favorites::FavoritesService::new(repository, counter.clone()),
            counter,
        }
    }
}
