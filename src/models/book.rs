//! Book (catalog entry) model and related types.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    /// Surrogate id, `None` until persisted
    pub id: Option<i64>,
    pub title: String,
    pub author: String,
    /// Business key, unique across the catalog
    pub isbn: String,
}

impl Book {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Isbn is required"))]
    pub isbn: String,
}

impl From<CreateBook> for Book {
    fn from(data: CreateBook) -> Self {
        Book::new(data.title, data.author, data.isbn)
    }
}

/// Update book request; the isbn of a book never changes
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
}

/// Book search filter.
///
/// Every field that is set must be contained in the matching book's field,
/// ignoring case. Unset or blank fields do not constrain the result.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookFilter {
    /// Substring of the title
    pub title: Option<String>,
    /// Substring of the author
    pub author: Option<String>,
    /// Substring of the isbn
    pub isbn: Option<String>,
}

impl BookFilter {
    pub fn title(&self) -> Option<&str> {
        non_blank(&self.title)
    }

    pub fn author(&self) -> Option<&str> {
        non_blank(&self.author)
    }

    pub fn isbn(&self) -> Option<&str> {
        non_blank(&self.isbn)
    }

    pub fn matches(&self, book: &Book) -> bool {
        [
            (self.title(), book.title.as_str()),
            (self.author(), book.author.as_str()),
            (self.isbn(), book.isbn.as_str()),
        ]
        .into_iter()
        .all(|(needle, haystack)| match needle {
            Some(needle) => contains_ignore_case(haystack, needle),
            None => true,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
