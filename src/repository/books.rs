//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{contains_pattern, map_constraint_error, BookStore};
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFilter, Page, PageRequest},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// WHERE clause and bind values for a book filter, fields AND-combined
fn filter_clause(filter: &BookFilter) -> (String, Vec<String>) {
    let mut conditions = vec!["1=1".to_string()];
    let mut binds = Vec::new();

    for (column, value) in [
        ("title", filter.title()),
        ("author", filter.author()),
        ("isbn", filter.isbn()),
    ] {
        if let Some(value) = value {
            binds.push(contains_pattern(value));
            conditions.push(format!("{} ILIKE ${}", column, binds.len()));
        }
    }

    (conditions.join(" AND "), binds)
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn insert(&self, book: &Book) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn)
            VALUES ($1, $2, $3)
            RETURNING id, title, author, isbn
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint_error)
    }

    async fn update(&self, book: &Book) -> AppResult<Book> {
        let id = book
            .id
            .ok_or_else(|| AppError::InvalidArgument("Book id is required".to_string()))?;

        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET title = $1, author = $2
            WHERE id = $3
            RETURNING id, title, author, isbn
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_constraint_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT id, title, author, isbn FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let book =
            sqlx::query_as::<_, Book>("SELECT id, title, author, isbn FROM books WHERE isbn = $1")
                .bind(isbn)
                .fetch_optional(&self.pool)
                .await?;
        Ok(book)
    }

    async fn exists_by_isbn(&self, isbn: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
                .bind(isbn)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn search(&self, filter: &BookFilter, page: &PageRequest) -> AppResult<Page<Book>> {
        let (where_clause, binds) = filter_clause(filter);

        let count_query = format!("SELECT COUNT(*) FROM books WHERE {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for value in &binds {
            count_builder = count_builder.bind(value);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT id, title, author, isbn FROM books WHERE {} ORDER BY id LIMIT ${} OFFSET ${}",
            where_clause,
            binds.len() + 1,
            binds.len() + 2
        );
        let mut builder = sqlx::query_as::<_, Book>(&select_query);
        for value in &binds {
            builder = builder.bind(value);
        }
        let books = builder
            .bind(page.size())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(books, page, total))
    }
}
