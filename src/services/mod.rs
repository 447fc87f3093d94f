//! Business logic services

pub mod books;
pub mod email;
pub mod loans;

use std::sync::Arc;

use crate::{clock::Clock, config::EmailConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub loans: loans::LoansService,
    pub email: email::EmailService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        clock: Arc<dyn Clock>,
        email_config: EmailConfig,
        mail_transport: Arc<dyn email::MailTransport>,
    ) -> Self {
        Self {
            books: books::BooksService::new(repository.clone()),
            loans: loans::LoansService::new(repository, clock),
            email: email::EmailService::new(email_config, mail_transport),
        }
    }
}
