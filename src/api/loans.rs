//! Loan management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;

use crate::{
    error::{AppError, AppResult},
    models::{CreateLoan, Loan, LoanFilter, LoanPage, NewLoan, PageRequest, ReturnLoan},
    AppState,
};

use super::ValidatedJson;

/// Lend the book with the given isbn to a customer
#[utoipa::path(
    post,
    path = "/api/loans",
    tag = "loans",
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created, body is the new loan id", body = i64),
        (status = 400, description = "Unknown isbn or book already loaned", body = ApiErrors)
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateLoan>,
) -> AppResult<(StatusCode, Json<i64>)> {
    tracing::info!("Create a loan for ISBN: {}", request.isbn);

    let book = state
        .services
        .books
        .get_by_isbn(&request.isbn)
        .await?
        .ok_or_else(|| AppError::BadRequest("Book not found for this isbn".to_string()))?;

    let loan = state
        .services
        .loans
        .save(NewLoan {
            customer: request.customer,
            customer_email: request.email,
            book,
        })
        .await?;

    let id = loan
        .id
        .ok_or_else(|| AppError::Internal("Saved loan has no id".to_string()))?;
    Ok((StatusCode::CREATED, Json(id)))
}

/// Mark a loan as returned (or not)
#[utoipa::path(
    patch,
    path = "/api/loans/{id}",
    tag = "loans",
    params(("id" = i64, Path, description = "Loan ID")),
    request_body = ReturnLoan,
    responses(
        (status = 200, description = "Loan updated", body = Loan),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(request), _): WithRejection<Json<ReturnLoan>, AppError>,
) -> AppResult<Json<Loan>> {
    tracing::info!("Setting returned={} on loan {}", request.returned, id);

    let mut loan = state
        .services
        .loans
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", id)))?;
    loan.returned = Some(request.returned);

    let updated = state.services.loans.update(&loan).await?;
    Ok(Json(updated))
}

/// List loans by isbn or customer
#[utoipa::path(
    get,
    path = "/api/loans",
    tag = "loans",
    params(LoanFilter, PageRequest),
    responses(
        (status = 200, description = "Page of loans", body = LoanPage)
    )
)]
pub async fn list_loans(
    State(state): State<AppState>,
    WithRejection(Query(filter), _): WithRejection<Query<LoanFilter>, AppError>,
    WithRejection(Query(page), _): WithRejection<Query<PageRequest>, AppError>,
) -> AppResult<Json<LoanPage>> {
    tracing::info!("Getting a list of loans");
    let loans = state.services.loans.find(&filter, &page).await?;
    Ok(Json(loans))
}
