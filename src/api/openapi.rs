//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, favorites, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookshelf API",
        version = "1.0.0",
        description = "Book catalog and favorites REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::list_books_by_favorites,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Favorites
        favorites::list_favorites,
        favorites::add_favorite,
        favorites::remove_favorite,
        favorites::check_favorite,
    ),
    components(
        schemas(
            // Books
            crate::models::Book,
            crate::models::BookQuery,
            crate::models::BookSortQuery,
            crate::models::CreateBook,
            crate::models::UpdateBook,
            // Favorites
            crate::models::Favorite,
            crate::models::favorite::AddFavorite,
            favorites::FavoriteCheckResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Catalog management and search"),
        (name = "favorites", description = "Per-user favorites")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
