//! Book (catalog entry) model and request types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

/// Hard ceiling on a book's favorite counter
pub const MAX_FAVORITE_COUNT: i32 = 1000;

/// Highest accepted catalog price
pub const MAX_PRICE: Decimal = Decimal::from_parts(999_999, 0, 0, false, 2);

pub const UNKNOWN_AUTHOR: &str = "Unknown author";
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Catalog book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub name: String,
    pub author: Option<String>,
    pub category: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub description: Option<String>,
    /// Denormalized number of favorites; `None` means never initialized
    pub favorite_count: Option<i32>,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

impl Book {
    /// Favorite count with an uninitialized counter read as zero
    pub fn favorite_count_or_zero(&self) -> i32 {
        self.favorite_count.unwrap_or(0)
    }

    /// Fill in display defaults for missing author, category and price
    pub fn normalized(mut self) -> Self {
        if self.author.as_deref().map_or(true, str::is_empty) {
            self.author = Some(UNKNOWN_AUTHOR.to_string());
        }
        if self.category.as_deref().map_or(true, str::is_empty) {
            self.category = Some(UNCATEGORIZED.to_string());
        }
        if self.price.map_or(true, |p| p.is_sign_negative()) {
            self.price = Some(Decimal::new(0, 2));
        }
        self
    }
}

/// A book about to be inserted; the store assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub name: String,
    pub author: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub favorite_count: Option<i32>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl From<CreateBook> for NewBook {
    fn from(book: CreateBook) -> Self {
        let now = Utc::now();
        Self {
            name: book.name,
            author: Some(book.author),
            category: Some(book.category),
            price: Some(book.price),
            description: book.description,
            favorite_count: Some(0),
            create_time: now,
            update_time: now,
        }
    }
}

fn text_rule(
    value: &str,
    max_chars: usize,
    empty_message: &'static str,
    too_long_message: &'static str,
) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len == 0 {
        let mut err = ValidationError::new("required");
        err.message = Some(empty_message.into());
        return Err(err);
    }
    if value.chars().count() > max_chars {
        let mut err = ValidationError::new("length");
        err.message = Some(too_long_message.into());
        return Err(err);
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    text_rule(name, 50, "Title must not be empty", "Title is too long")
}

fn validate_author(author: &str) -> Result<(), ValidationError> {
    text_rule(author, 30, "Author must not be empty", "Author is too long")
}

fn validate_category(category: &str) -> Result<(), ValidationError> {
    text_rule(category, 30, "Category must not be empty", "Category is too long")
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price <= Decimal::ZERO || *price > MAX_PRICE {
        let mut err = ValidationError::new("price_range");
        err.message = Some("Price is invalid".into());
        return Err(err);
    }
    Ok(())
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(custom(function = "validate_author"))]
    pub author: String,
    #[validate(custom(function = "validate_category"))]
    pub category: String,
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = String)]
    pub price: Decimal,
    #[validate(length(max = 200, message = "Description is too long"))]
    pub description: Option<String>,
}

/// Update book request (favorite count is not editable)
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(custom(function = "validate_name"))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_author"))]
    pub author: Option<String>,
    #[validate(custom(function = "validate_category"))]
    pub category: Option<String>,
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[validate(length(max = 200, message = "Description is too long"))]
    pub description: Option<String>,
}

impl UpdateBook {
    /// Apply the provided fields onto an existing book
    pub fn apply_to(self, book: &mut Book) {
        if let Some(name) = self.name {
            book.name = name;
        }
        if let Some(author) = self.author {
            book.author = Some(author);
        }
        if let Some(category) = self.category {
            book.category = Some(category);
        }
        if let Some(price) = self.price {
            book.price = Some(price);
        }
        if let Some(description) = self.description {
            book.description = Some(description);
        }
    }
}

/// Catalog search parameters
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Keyword matched against name, author and category
    #[validate(length(max = 50, message = "Search keyword is too long"))]
    pub query: Option<String>,
}

/// Catalog search parameters with favorite-count ordering
#[derive(Debug, Clone, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookSortQuery {
    /// Keyword matched against name, author, category and description
    #[validate(length(max = 50, message = "Search keyword is too long"))]
    pub query: Option<String>,
    /// `asc` for ascending; any other value sorts descending
    #[serde(default = "default_sort_type")]
    pub sort_type: String,
}

fn default_sort_type() -> String {
    "desc".to_string()
}
