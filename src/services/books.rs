//! Book catalog service

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFilter, Page, PageRequest},
    repository::{Repository, ISBN_EXISTS},
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

/// Id of a persisted book, or the misuse error for one that never was
fn persisted_id(book: &Book) -> AppResult<i64> {
    book.id
        .ok_or_else(|| AppError::InvalidArgument("Book or id can't be null".to_string()))
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Add a book to the catalog; the isbn must not be taken
    pub async fn create(&self, book: Book) -> AppResult<Book> {
        if self.repository.books.exists_by_isbn(&book.isbn).await? {
            return Err(AppError::Conflict(ISBN_EXISTS.to_string()));
        }
        let created = self.repository.books.insert(&book).await?;
        tracing::debug!(id = ?created.id, isbn = %created.isbn, "Book created");
        Ok(created)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        self.repository.books.find_by_id(id).await
    }

    pub async fn get_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        self.repository.books.find_by_isbn(isbn).await
    }

    /// Persist new author and title of a stored book
    pub async fn update(&self, book: &Book) -> AppResult<Book> {
        persisted_id(book)?;
        self.repository.books.update(book).await
    }

    pub async fn delete(&self, book: &Book) -> AppResult<()> {
        let id = persisted_id(book)?;
        self.repository.books.delete(id).await
    }

    pub async fn find(&self, filter: &BookFilter, page: &PageRequest) -> AppResult<Page<Book>> {
        self.repository.books.search(filter, page).await
    }
}
