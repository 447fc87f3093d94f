//! In-process store implementing both book and loan persistence.
//!
//! Enforces the same constraints as the Postgres schema: unique isbn, at most
//! one unreturned loan per book, and no deleting a book that has loans.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{BookStore, LoanStore, BOOK_ALREADY_LOANED, BOOK_HAS_LOANS, ISBN_EXISTS};
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFilter, Loan, LoanFilter, Page, PageRequest},
};

/// Stored loan; the book is joined on read
#[derive(Debug, Clone)]
struct LoanRecord {
    customer: String,
    customer_email: Option<String>,
    book_id: i64,
    loan_date: NaiveDate,
    returned: Option<bool>,
}

#[derive(Debug, Default)]
struct Tables {
    books: BTreeMap<i64, Book>,
    loans: BTreeMap<i64, LoanRecord>,
    next_book_id: i64,
    next_loan_id: i64,
}

impl Tables {
    fn loan(&self, id: i64) -> Option<Loan> {
        let record = self.loans.get(&id)?;
        let book = self.books.get(&record.book_id)?.clone();
        Some(Loan {
            id: Some(id),
            customer: record.customer.clone(),
            customer_email: record.customer_email.clone(),
            loan_date: record.loan_date,
            returned: record.returned,
            book,
        })
    }

    fn loans_where(&self, predicate: impl Fn(&Loan) -> bool) -> Vec<Loan> {
        self.loans
            .keys()
            .filter_map(|id| self.loan(*id))
            .filter(|loan| predicate(loan))
            .collect()
    }

    fn has_other_active_loan(&self, book_id: i64, except: Option<i64>) -> bool {
        self.loans.iter().any(|(id, record)| {
            Some(*id) != except && record.book_id == book_id && record.returned != Some(true)
        })
    }

    fn record_for(&self, loan: &Loan) -> AppResult<LoanRecord> {
        let book_id = loan
            .book
            .id
            .ok_or_else(|| AppError::InvalidArgument("Loan book id is required".to_string()))?;
        if !self.books.contains_key(&book_id) {
            return Err(AppError::NotFound(format!("Book {} not found", book_id)));
        }
        Ok(LoanRecord {
            customer: loan.customer.clone(),
            customer_email: loan.customer_email.clone(),
            book_id,
            loan_date: loan.loan_date,
            returned: loan.returned,
        })
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn insert(&self, book: &Book) -> AppResult<Book> {
        let mut tables = self.lock();
        if tables.books.values().any(|b| b.isbn == book.isbn) {
            return Err(AppError::Conflict(ISBN_EXISTS.to_string()));
        }
        tables.next_book_id += 1;
        let id = tables.next_book_id;
        let stored = book.clone().with_id(id);
        tables.books.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, book: &Book) -> AppResult<Book> {
        let id = book
            .id
            .ok_or_else(|| AppError::InvalidArgument("Book id is required".to_string()))?;
        let mut tables = self.lock();
        let stored = tables
            .books
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;
        stored.title = book.title.clone();
        stored.author = book.author.clone();
        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tables = self.lock();
        if !tables.books.contains_key(&id) {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        if tables.loans.values().any(|l| l.book_id == id) {
            return Err(AppError::Conflict(BOOK_HAS_LOANS.to_string()));
        }
        tables.books.remove(&id);
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        Ok(self.lock().books.get(&id).cloned())
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        Ok(self.lock().books.values().find(|b| b.isbn == isbn).cloned())
    }

    async fn exists_by_isbn(&self, isbn: &str) -> AppResult<bool> {
        Ok(self.lock().books.values().any(|b| b.isbn == isbn))
    }

    async fn search(&self, filter: &BookFilter, page: &PageRequest) -> AppResult<Page<Book>> {
        let matches = self
            .lock()
            .books
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        Ok(Page::from_all(matches, page))
    }
}

#[async_trait]
impl LoanStore for MemoryStore {
    async fn insert(&self, loan: &Loan) -> AppResult<Loan> {
        let mut tables = self.lock();
        let record = tables.record_for(loan)?;
        if record.returned != Some(true) && tables.has_other_active_loan(record.book_id, None) {
            return Err(AppError::Conflict(BOOK_ALREADY_LOANED.to_string()));
        }
        tables.next_loan_id += 1;
        let id = tables.next_loan_id;
        tables.loans.insert(id, record);
        tables
            .loan(id)
            .ok_or_else(|| AppError::Internal(format!("Loan {} vanished after insert", id)))
    }

    async fn update(&self, loan: &Loan) -> AppResult<Loan> {
        let id = loan
            .id
            .ok_or_else(|| AppError::InvalidArgument("Loan id is required".to_string()))?;
        let mut tables = self.lock();
        if !tables.loans.contains_key(&id) {
            return Err(AppError::NotFound(format!("Loan {} not found", id)));
        }
        let record = tables.record_for(loan)?;
        if record.returned != Some(true) && tables.has_other_active_loan(record.book_id, Some(id)) {
            return Err(AppError::Conflict(BOOK_ALREADY_LOANED.to_string()));
        }
        tables.loans.insert(id, record);
        tables
            .loan(id)
            .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", id)))
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Loan>> {
        Ok(self.lock().loan(id))
    }

    async fn exists_active_for_book(&self, book_id: i64) -> AppResult<bool> {
        Ok(self.lock().has_other_active_loan(book_id, None))
    }

    async fn search(&self, filter: &LoanFilter, page: &PageRequest) -> AppResult<Page<Loan>> {
        let matches = self.lock().loans_where(|loan| filter.matches(loan));
        Ok(Page::from_all(matches, page))
    }

    async fn find_by_book(&self, book_id: i64, page: &PageRequest) -> AppResult<Page<Loan>> {
        let matches = self.lock().loans_where(|loan| loan.book.id == Some(book_id));
        Ok(Page::from_all(matches, page))
    }

    async fn find_unreturned_since(&self, cutoff: NaiveDate) -> AppResult<Vec<Loan>> {
        Ok(self.lock().loans_where(|loan| loan.is_unreturned_since(cutoff)))
    }
}
