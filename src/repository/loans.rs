//! Loans repository for database operations

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use super::{map_constraint_error, LoanStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        loan::LoanRow, Loan, LoanFilter, Page, PageRequest,
    },
};

const SELECT_LOAN: &str = r#"
    SELECT l.id, l.customer, l.customer_email, l.loan_date, l.returned,
           b.id AS book_id, b.title AS book_title, b.author AS book_author, b.isbn AS book_isbn
    FROM loans l
    JOIN books b ON b.id = l.book_id
"#;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn get(&self, id: i64) -> AppResult<Loan> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", id)))
    }

    /// Run a filtered, paginated loan query; `binds` fill `$1..$n` of `where_clause`
    async fn page(
        &self,
        where_clause: &str,
        binds: &[&str],
        book_id: Option<i64>,
        page: &PageRequest,
    ) -> AppResult<Page<Loan>> {
        let mut next = binds.len() + 1;
        let mut where_clause = where_clause.to_string();
        if book_id.is_some() {
            where_clause = format!("({}) AND l.book_id = ${}", where_clause, next);
            next += 1;
        }

        let count_query = format!(
            "SELECT COUNT(*) FROM loans l JOIN books b ON b.id = l.book_id WHERE {}",
            where_clause
        );
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for value in binds {
            count_builder = count_builder.bind(*value);
        }
        if let Some(book_id) = book_id {
            count_builder = count_builder.bind(book_id);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "{} WHERE {} ORDER BY l.id LIMIT ${} OFFSET ${}",
            SELECT_LOAN,
            where_clause,
            next,
            next + 1
        );
        let mut builder = sqlx::query_as::<_, LoanRow>(&select_query);
        for value in binds {
            builder = builder.bind(*value);
        }
        if let Some(book_id) = book_id {
            builder = builder.bind(book_id);
        }
        let rows = builder
            .bind(page.size())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(rows.into_iter().map(Loan::from).collect(), page, total))
    }
}

/// WHERE clause and bind values for a loan filter, fields OR-combined
fn filter_clause(filter: &LoanFilter) -> (String, Vec<&str>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(isbn) = filter.isbn() {
        binds.push(isbn);
        conditions.push(format!("b.isbn = ${}", binds.len()));
    }
    if let Some(customer) = filter.customer() {
        binds.push(customer);
        conditions.push(format!("l.customer = ${}", binds.len()));
    }

    if conditions.is_empty() {
        ("FALSE".to_string(), binds)
    } else {
        (conditions.join(" OR "), binds)
    }
}

#[async_trait]
impl LoanStore for LoansRepository {
    async fn insert(&self, loan: &Loan) -> AppResult<Loan> {
        let book_id = loan
            .book
            .id
            .ok_or_else(|| AppError::InvalidArgument("Loan book id is required".to_string()))?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO loans (customer, customer_email, book_id, loan_date, returned)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&loan.customer)
        .bind(&loan.customer_email)
        .bind(book_id)
        .bind(loan.loan_date)
        .bind(loan.returned)
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint_error)?;

        self.get(id).await
    }

    async fn update(&self, loan: &Loan) -> AppResult<Loan> {
        let id = loan
            .id
            .ok_or_else(|| AppError::InvalidArgument("Loan id is required".to_string()))?;
        let book_id = loan
            .book
            .id
            .ok_or_else(|| AppError::InvalidArgument("Loan book id is required".to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE loans
            SET customer = $1, customer_email = $2, book_id = $3, loan_date = $4, returned = $5
            WHERE id = $6
            "#,
        )
        .bind(&loan.customer)
        .bind(&loan.customer_email)
        .bind(book_id)
        .bind(loan.loan_date)
        .bind(loan.returned)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_constraint_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Loan {} not found", id)));
        }
        self.get(id).await
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Loan>> {
        let row = sqlx::query_as::<_, LoanRow>(&format!("{} WHERE l.id = $1", SELECT_LOAN))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Loan::from))
    }

    async fn exists_active_for_book(&self, book_id: i64) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE book_id = $1 AND returned IS NOT TRUE)",
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn search(&self, filter: &LoanFilter, page: &PageRequest) -> AppResult<Page<Loan>> {
        let (where_clause, binds) = filter_clause(filter);
        self.page(&where_clause, &binds, None, page).await
    }

    async fn find_by_book(&self, book_id: i64, page: &PageRequest) -> AppResult<Page<Loan>> {
        self.page("1=1", &[], Some(book_id), page).await
    }

    async fn find_unreturned_since(&self, cutoff: NaiveDate) -> AppResult<Vec<Loan>> {
        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            "{} WHERE l.loan_date <= $1 AND l.returned IS NOT TRUE ORDER BY l.id",
            SELECT_LOAN
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Loan::from).collect())
    }
}
