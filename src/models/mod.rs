//! Data models for the library server

pub mod book;
pub mod loan;
pub mod page;

// Re-export commonly used types
pub use book::{Book, BookFilter, CreateBook, UpdateBook};
pub use loan::{CreateLoan, Loan, LoanFilter, NewLoan, ReturnLoan};
pub use page::{BookPage, LoanPage, Page, PageRequest};
