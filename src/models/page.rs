//! Pagination request and response types

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{book::Book, loan::Loan};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Zero-based page request
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageRequest {
    /// Page number, starting at 0 (default: 0)
    pub page: Option<i64>,
    /// Page size (default: 10, max: 100)
    pub size: Option<i64>,
}

impl PageRequest {
    pub fn of(page: i64, size: i64) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
        }
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(0).max(0)
    }

    pub fn size(&self) -> i64 {
        self.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Rows to skip; saturates instead of overflowing on huge page numbers
    pub fn offset(&self) -> i64 {
        self.page().saturating_mul(self.size())
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[aliases(BookPage = Page<Book>, LoanPage = Page<Loan>)]
pub struct Page<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Entries of this page
    pub content: Vec<T>,
    /// Current page number
    pub page: i64,
    /// Requested page size
    pub size: i64,
    /// Number of matching entries across all pages
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> Page<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: i64) -> Self {
        let size = request.size();
        Self {
            content,
            page: request.page(),
            size,
            total_elements,
            total_pages: (total_elements + size - 1) / size,
        }
    }

    /// Slice an already filtered, ordered list into the requested page
    pub fn from_all(all: Vec<T>, request: &PageRequest) -> Self {
        let total = all.len() as i64;
        let content = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.size() as usize)
            .collect();
        Self::new(content, request, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn books(n: i64) -> Vec<Book> {
        (1..=n)
            .map(|i| Book::new(format!("Title {}", i), "Author", format!("isbn-{}", i)).with_id(i))
            .collect()
    }

    #[test]
    fn test_page_request_defaults_and_clamping() {
        let request = PageRequest::default();
        assert_eq!(request.page(), 0);
        assert_eq!(request.size(), DEFAULT_PAGE_SIZE);

        let request = PageRequest::of(-2, 1000);
        assert_eq!(request.page(), 0);
        assert_eq!(request.size(), MAX_PAGE_SIZE);
        assert_eq!(PageRequest::of(3, 0).size(), 1);
        assert_eq!(PageRequest::of(3, 10).offset(), 30);
    }

    #[test]
    fn test_from_all_slices_requested_page() {
        let page = Page::from_all(books(25), &PageRequest::of(2, 10));
        assert_eq!(page.content.len(), 5);
        assert_eq!(page.content[0].id, Some(21));
        assert_eq!(page.total_elements, 25);
        assert_eq!(page.total_pages, 3);

        let past_end = Page::from_all(books(5), &PageRequest::of(4, 10));
        assert!(past_end.content.is_empty());
        assert_eq!(past_end.total_elements, 5);
    }

    #[test]
    fn test_huge_page_number_saturates() {
        let request = PageRequest::of(i64::MAX, 10);
        assert_eq!(request.offset(), i64::MAX);

        let page = Page::from_all(books(5), &request);
        assert!(page.content.is_empty());
        assert_eq!(page.page, i64::MAX);
        assert_eq!(page.total_elements, 5);
    }
}
