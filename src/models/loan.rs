//! Loan model and related types

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::book::Book;

/// A loan becomes late once its loan date is this many days in the past
pub const LATE_LOAN_THRESHOLD_DAYS: i64 = 3;

/// Latest loan date that still counts as late on `today`
pub fn late_loan_cutoff(today: NaiveDate) -> NaiveDate {
    today - Duration::days(LATE_LOAN_THRESHOLD_DAYS)
}

/// Loan with its book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Loan {
    /// Surrogate id, `None` until persisted
    pub id: Option<i64>,
    pub customer: String,
    #[serde(rename = "email")]
    pub customer_email: Option<String>,
    pub loan_date: NaiveDate,
    /// Unset and `false` both mean the book is still out
    pub returned: Option<bool>,
    pub book: Book,
}

impl Loan {
    pub fn is_active(&self) -> bool {
        self.returned != Some(true)
    }

    /// Active and dated on or before `cutoff`
    pub fn is_unreturned_since(&self, cutoff: NaiveDate) -> bool {
        self.is_active() && self.loan_date <= cutoff
    }
}

/// Data for a loan that has not been saved yet
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub customer: String,
    pub customer_email: Option<String>,
    pub book: Book,
}

/// Flat loan row joined with its book
#[derive(Debug, FromRow)]
pub struct LoanRow {
    pub id: i64,
    pub customer: String,
    pub customer_email: Option<String>,
    pub loan_date: NaiveDate,
    pub returned: Option<bool>,
    pub book_id: i64,
    pub book_title: String,
    pub book_author: String,
    pub book_isbn: String,
}

impl From<LoanRow> for Loan {
    fn from(row: LoanRow) -> Self {
        Self {
            id: Some(row.id),
            customer: row.customer,
            customer_email: row.customer_email,
            loan_date: row.loan_date,
            returned: row.returned,
            book: Book {
                id: Some(row.book_id),
                title: row.book_title,
                author: row.book_author,
                isbn: row.book_isbn,
            },
        }
    }
}

/// Create loan request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLoan {
    /// Isbn of the book to borrow
    #[serde(default)]
    #[validate(length(min = 1, message = "Isbn is required"))]
    pub isbn: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Customer is required"))]
    pub customer: String,
    /// Address used for late-return notices
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// Return (or un-return) a loan
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReturnLoan {
    pub returned: bool,
}

/// Loan search filter.
///
/// A loan matches when its book isbn equals `isbn` or its customer equals
/// `customer`. With neither set, nothing matches.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LoanFilter {
    pub isbn: Option<String>,
    pub customer: Option<String>,
}

impl LoanFilter {
    pub fn isbn(&self) -> Option<&str> {
        self.isbn.as_deref().filter(|v| !v.is_empty())
    }

    pub fn customer(&self) -> Option<&str> {
        self.customer.as_deref().filter(|v| !v.is_empty())
    }

    pub fn matches(&self, loan: &Loan) -> bool {
        self.isbn() == Some(loan.book.isbn.as_str())
            || self.customer() == Some(loan.customer.as_str())
    }
}
