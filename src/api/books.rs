//! Book catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFilter, BookPage, CreateBook, LoanPage, PageRequest, UpdateBook},
    AppState,
};

use super::ValidatedJson;

async fn load_book(state: &AppState, id: i64) -> AppResult<Book> {
    state
        .services
        .books
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/api/books",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input or isbn already exists", body = ApiErrors)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    ValidatedJson(data): ValidatedJson<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    tracing::info!("Create a book for ISBN: {}", data.isbn);
    let created = state.services.books.create(data.into()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get book by id
#[utoipa::path(
    get,
    path = "/api/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<Json<Book>> {
    tracing::info!("Getting a book with id: {}", id);
    Ok(Json(load_book(&state, id).await?))
}

/// Update author and title of a book
#[utoipa::path(
    put,
    path = "/api/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input", body = ApiErrors),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    ValidatedJson(data): ValidatedJson<UpdateBook>,
) -> AppResult<Json<Book>> {
    tracing::info!("Updating a book with id: {}", id);
    let mut book = load_book(&state, id).await?;
    book.author = data.author;
    book.title = data.title;
    let updated = state.services.books.update(&book).await?;
    Ok(Json(updated))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 400, description = "Book has loans", body = ApiErrors),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<StatusCode> {
    tracing::info!("Deleting a book with id: {}", id);
    let book = load_book(&state, id).await?;
    state.services.books.delete(&book).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List books matching a filter
#[utoipa::path(
    get,
    path = "/api/books",
    tag = "books",
    params(BookFilter, PageRequest),
    responses(
        (status = 200, description = "Page of books", body = BookPage)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    WithRejection(Query(filter), _): WithRejection<Query<BookFilter>, AppError>,
    WithRejection(Query(page), _): WithRejection<Query<PageRequest>, AppError>,
) -> AppResult<Json<BookPage>> {
    tracing::info!("Getting a list of books");
    let books = state.services.books.find(&filter, &page).await?;
    Ok(Json(books))
}

/// List the loans of a book
#[utoipa::path(
    get,
    path = "/api/books/{id}/loans",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID"), PageRequest),
    responses(
        (status = 200, description = "Page of loans", body = LoanPage),
        (status = 404, description = "Book not found")
    )
)]
pub async fn list_book_loans(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Query(page), _): WithRejection<Query<PageRequest>, AppError>,
) -> AppResult<Json<LoanPage>> {
    tracing::info!("Getting a list of loans for book {}", id);
    let book = load_book(&state, id).await?;
    let loans = state.services.loans.get_loans_by_book(&book, &page).await?;
    Ok(Json(loans))
}
