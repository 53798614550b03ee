//! Catalog query engine: in-memory filtering and ordering of books

use std::cmp::Ordering;

use crate::models::Book;

/// Ordering requested for favorite-count sorts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `asc` (any case) is ascending; every other value falls back to descending
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("asc") {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }
}

fn field_contains(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|value| value.to_lowercase().contains(needle))
}

fn matches_catalog_fields(book: &Book, needle: &str) -> bool {
    field_contains(Some(book.name.as_str()), needle)
        || field_contains(book.author.as_deref(), needle)
        || field_contains(book.category.as_deref(), needle)
}

/// Newest update first; books that were never updated go last
fn by_update_time_desc(a: &Book, b: &Book) -> Ordering {
    match (a.update_time, b.update_time) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Filter on name, author or category and order by update time, newest first.
/// A blank query keeps every book.
pub fn search(books: Vec<Book>, query: &str) -> Vec<Book> {
    let mut result: Vec<Book> = if query.trim().is_empty() {
        books
    } else {
        let needle = query.to_lowercase();
        books
            .into_iter()
            .filter(|book| matches_catalog_fields(book, &needle))
            .collect()
    };

    result.sort_by(by_update_time_desc);
    result
}

/// Filter on name, author, category or description and order by favorite
/// count. Missing counts compare as zero; ties keep their input order.
pub fn search_and_sort(books: Vec<Book>, query: &str, direction: SortDirection) -> Vec<Book> {
    let mut result: Vec<Book> = if query.trim().is_empty() {
        books
    } else {
        let needle = query.to_lowercase();
        books
            .into_iter()
            .filter(|book| {
                matches_catalog_fields(book, &needle)
                    || field_contains(book.description.as_deref(), &needle)
            })
            .collect()
    };

    match direction {
        SortDirection::Asc => result.sort_by_key(|book| book.favorite_count_or_zero()),
        SortDirection::Desc => result.sort_by_key(|book| std::cmp::Reverse(book.favorite_count_or_zero())),
    }
    result
}
