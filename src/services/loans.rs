//! Loan management service

use std::sync::Arc;

use crate::{
    clock::Clock,
    error::{AppError, AppResult},
    models::{
        loan::late_loan_cutoff, Book, Loan, LoanFilter, NewLoan, Page, PageRequest,
    },
    repository::{Repository, BOOK_ALREADY_LOANED},
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    clock: Arc<dyn Clock>,
}

impl LoansService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Lend a book, dated today. Fails when the book is still out on another loan.
    pub async fn save(&self, loan: NewLoan) -> AppResult<Loan> {
        let book_id = loan
            .book
            .id
            .ok_or_else(|| AppError::InvalidArgument("Loan book must be persisted".to_string()))?;

        if self.repository.loans.exists_active_for_book(book_id).await? {
            return Err(AppError::Conflict(BOOK_ALREADY_LOANED.to_string()));
        }

        let loan = Loan {
            id: None,
            customer: loan.customer,
            customer_email: loan.customer_email,
            loan_date: self.clock.today(),
            returned: None,
            book: loan.book,
        };
        let saved = self.repository.loans.insert(&loan).await?;
        tracing::debug!(id = ?saved.id, book_id, "Loan created");
        Ok(saved)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Option<Loan>> {
        self.repository.loans.find_by_id(id).await
    }

    /// Persist the whole loan record, typically to flip `returned`
    pub async fn update(&self, loan: &Loan) -> AppResult<Loan> {
        if loan.id.is_none() {
            return Err(AppError::InvalidArgument("Loan or id can't be null".to_string()));
        }
        self.repository.loans.update(loan).await
    }

    pub async fn find(&self, filter: &LoanFilter, page: &PageRequest) -> AppResult<Page<Loan>> {
        self.repository.loans.search(filter, page).await
    }

    pub async fn get_loans_by_book(&self, book: &Book, page: &PageRequest) -> AppResult<Page<Loan>> {
        let book_id = book
            .id
            .ok_or_else(|| AppError::InvalidArgument("Book or id can't be null".to_string()))?;
        self.repository.loans.find_by_book(book_id, page).await
    }

    /// Unreturned loans dated at least three days ago
    pub async fn get_all_late_loans(&self) -> AppResult<Vec<Loan>> {
        let cutoff = late_loan_cutoff(self.clock.today());
        self.repository.loans.find_unreturned_since(cutoff).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::*;
    use crate::clock::FixedClock;

    struct Fixture {
        repository: Repository,
        clock: Arc<FixedClock>,
        loans: LoansService,
    }

    fn fixture() -> Fixture {
        let repository = Repository::in_memory();
        let clock = Arc::new(FixedClock::at_date(
            NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        ));
        let loans = LoansService::new(repository.clone(), clock.clone());
        Fixture {
            repository,
            clock,
            loans,
        }
    }

    async fn add_book(fx: &Fixture, isbn: &str) -> Book {
        fx.repository
            .books
            .insert(&Book::new("Title", "Author", isbn))
            .await
            .unwrap()
    }

    fn new_loan(book: &Book, customer: &str) -> NewLoan {
        NewLoan {
            customer: customer.to_string(),
            customer_email: Some(format!("{}@example.com", customer.to_lowercase())),
            book: book.clone(),
        }
    }

    #[tokio::test]
    async fn test_save_dates_loan_today() {
        let fx = fixture();
        let book = add_book(&fx, "123").await;

        let loan = fx.loans.save(new_loan(&book, "Cliente")).await.unwrap();
        assert_eq!(loan.id, Some(1));
        assert_eq!(loan.customer, "Cliente");
        assert_eq!(loan.book, book);
        assert_eq!(loan.loan_date, NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
        assert_eq!(loan.returned, None);
    }

    #[tokio::test]
    async fn test_save_loaned_book_conflicts() {
        let fx = fixture();
        let book = add_book(&fx, "123").await;
        fx.loans.save(new_loan(&book, "Cliente")).await.unwrap();

        let err = fx.loans.save(new_loan(&book, "Other")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == "Book already loaned"));
    }

    #[tokio::test]
    async fn test_returned_false_still_blocks_new_loan() {
        let fx = fixture();
        let book = add_book(&fx, "123").await;
        let mut loan = fx.loans.save(new_loan(&book, "Cliente")).await.unwrap();
        loan.returned = Some(false);
        fx.loans.update(&loan).await.unwrap();

        assert!(fx.loans.save(new_loan(&book, "Other")).await.is_err());
    }

    #[tokio::test]
    async fn test_return_frees_the_book() {
        let fx = fixture();
        let book = add_book(&fx, "123").await;
        let mut loan = fx.loans.save(new_loan(&book, "Cliente")).await.unwrap();

        loan.returned = Some(true);
        let updated = fx.loans.update(&loan).await.unwrap();
        assert_eq!(updated.returned, Some(true));

        let again = fx.loans.save(new_loan(&book, "Other")).await.unwrap();
        assert_eq!(again.id, Some(2));
    }

    #[tokio::test]
    async fn test_update_requires_id() {
        let fx = fixture();
        let book = add_book(&fx, "123").await;
        let loan = Loan {
            id: None,
            customer: "Cliente".to_string(),
            customer_email: None,
            loan_date: fx.clock.today(),
            returned: Some(true),
            book,
        };
        let err = fx.loans.update(&loan).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_find_by_isbn_or_customer() {
        let fx = fixture();
        let first = add_book(&fx, "111").await;
        let second = add_book(&fx, "222").await;
        let third = add_book(&fx, "333").await;
        fx.loans.save(new_loan(&first, "Ana")).await.unwrap();
        fx.loans.save(new_loan(&second, "Bruno")).await.unwrap();
        fx.loans.save(new_loan(&third, "Carla")).await.unwrap();

        let filter = LoanFilter {
            isbn: Some("111".to_string()),
            customer: Some("Carla".to_string()),
        };
        let page = fx.loans.find(&filter, &PageRequest::default()).await.unwrap();
        assert_eq!(page.total_elements, 2);
        let customers: Vec<_> = page.content.iter().map(|l| l.customer.as_str()).collect();
        assert_eq!(customers, vec!["Ana", "Carla"]);
    }

    #[tokio::test]
    async fn test_loans_by_book_keeps_history() {
        let fx = fixture();
        let book = add_book(&fx, "123").await;
        for customer in ["Ana", "Bruno", "Carla"] {
            let mut loan = fx.loans.save(new_loan(&book, customer)).await.unwrap();
            loan.returned = Some(true);
            fx.loans.update(&loan).await.unwrap();
        }
        let other = add_book(&fx, "999").await;
        fx.loans.save(new_loan(&other, "Dora")).await.unwrap();

        let page = fx
            .loans
            .get_loans_by_book(&book, &PageRequest::of(0, 2))
            .await
            .unwrap();
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.content.len(), 2);
        assert!(page.content.iter().all(|l| l.book.isbn == "123"));
    }

    #[tokio::test]
    async fn test_late_loans_use_three_day_threshold() {
        let fx = fixture();
        let on_cutoff = add_book(&fx, "1").await;
        let too_recent = add_book(&fx, "2").await;
        let returned = add_book(&fx, "3").await;
        let unset_old = add_book(&fx, "4").await;

        // 2024-05-05
        fx.clock.advance(Duration::days(-5));
        fx.loans.save(new_loan(&unset_old, "Dora")).await.unwrap();
        let mut done = fx.loans.save(new_loan(&returned, "Carla")).await.unwrap();
        done.returned = Some(true);
        fx.loans.update(&done).await.unwrap();

        // 2024-05-07, exactly three days before "today"
        fx.clock.advance(Duration::days(2));
        let mut flagged = fx.loans.save(new_loan(&on_cutoff, "Ana")).await.unwrap();
        flagged.returned = Some(false);
        fx.loans.update(&flagged).await.unwrap();

        // 2024-05-08
        fx.clock.advance(Duration::days(1));
        fx.loans.save(new_loan(&too_recent, "Bruno")).await.unwrap();

        // back to 2024-05-10
        fx.clock.advance(Duration::days(2));
        let late = fx.loans.get_all_late_loans().await.unwrap();
        let mut isbns: Vec<_> = late.iter().map(|l| l.book.isbn.as_str()).collect();
        isbns.sort();
        assert_eq!(isbns, vec!["1", "4"]);

        // one more day and the 2024-05-08 loan is late too
        fx.clock.advance(Duration::days(1));
        assert_eq!(fx.loans.get_all_late_loans().await.unwrap().len(), 3);
    }
}
