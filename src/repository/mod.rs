//! Repository layer for database operations

pub mod books;
pub mod loans;
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFilter, Loan, LoanFilter, Page, PageRequest},
};

/// Postgres constraint names the stores translate into conflicts
pub(crate) const BOOKS_ISBN_KEY: &str = "books_isbn_key";
pub(crate) const LOANS_ACTIVE_BOOK_KEY: &str = "loans_active_book_key";
pub(crate) const LOANS_BOOK_FKEY: &str = "loans_book_id_fkey";

pub(crate) const ISBN_EXISTS: &str = "Isbn already exists.";
pub(crate) const BOOK_ALREADY_LOANED: &str = "Book already loaned";
pub(crate) const BOOK_HAS_LOANS: &str = "Book has loans and cannot be deleted";

/// Persistence of books
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a new book and return it with its assigned id
    async fn insert(&self, book: &Book) -> AppResult<Book>;

    /// Overwrite author and title of a persisted book
    async fn update(&self, book: &Book) -> AppResult<Book>;

    async fn delete(&self, id: i64) -> AppResult<()>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>>;

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>>;

    async fn exists_by_isbn(&self, isbn: &str) -> AppResult<bool>;

    async fn search(&self, filter: &BookFilter, page: &PageRequest) -> AppResult<Page<Book>>;
}

/// Persistence of loans
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// Insert a new loan and return it with its assigned id
    async fn insert(&self, loan: &Loan) -> AppResult<Loan>;

    /// Overwrite every column of a persisted loan
    async fn update(&self, loan: &Loan) -> AppResult<Loan>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Loan>>;

    /// Whether the book has a loan that is not returned
    async fn exists_active_for_book(&self, book_id: i64) -> AppResult<bool>;

    async fn search(&self, filter: &LoanFilter, page: &PageRequest) -> AppResult<Page<Loan>>;

    async fn find_by_book(&self, book_id: i64, page: &PageRequest) -> AppResult<Page<Loan>>;

    /// Loans dated on or before `cutoff` that are not returned
    async fn find_unreturned_since(&self, cutoff: NaiveDate) -> AppResult<Vec<Loan>>;
}

/// Main repository struct holding the stores
#[derive(Clone)]
pub struct Repository {
    pool: Option<Pool<Postgres>>,
    pub books: Arc<dyn BookStore>,
    pub loans: Arc<dyn LoanStore>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            loans: Arc::new(loans::LoansRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Repository backed by process memory
    pub fn in_memory() -> Self {
        let store = memory::MemoryStore::new();
        Self {
            pool: None,
            books: Arc::new(store.clone()),
            loans: Arc::new(store),
        }
    }

    /// Check that the backing database answers
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

/// Map constraint violations to business errors, everything else stays a database error
pub(crate) fn map_constraint_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        match db.constraint() {
            Some(BOOKS_ISBN_KEY) => return AppError::Conflict(ISBN_EXISTS.to_string()),
            Some(LOANS_ACTIVE_BOOK_KEY) => {
                return AppError::Conflict(BOOK_ALREADY_LOANED.to_string())
            }
            Some(LOANS_BOOK_FKEY) => return AppError::Conflict(BOOK_HAS_LOANS.to_string()),
            _ => {}
        }
    }
    AppError::Database(err)
}

/// `ILIKE` pattern matching `value` anywhere, with wildcards in `value` taken literally
pub(crate) fn contains_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
