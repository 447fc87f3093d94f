//! Daily late-loan notification job

use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::{
    clock::Clock,
    error::AppResult,
    services::{email::EmailService, loans::LoansService},
};

/// Emails every customer holding a late loan
#[derive(Clone)]
pub struct LateLoanJob {
    loans: LoansService,
    email: EmailService,
    message: String,
}

impl LateLoanJob {
    pub fn new(loans: LoansService, email: EmailService, message: impl Into<String>) -> Self {
        Self {
            loans,
            email,
            message: message.into(),
        }
    }

    /// Run a single tick. Returns the number of addresses notified.
    pub async fn run_once(&self) -> AppResult<usize> {
        let late_loans = self.loans.get_all_late_loans().await?;
        let recipients: Vec<String> = late_loans
            .into_iter()
            .filter_map(|loan| loan.customer_email)
            .filter(|email| !email.trim().is_empty())
            .collect();

        if recipients.is_empty() {
            tracing::info!("No late loans with a contact email");
            return Ok(0);
        }

        self.email.send_emails(&self.message, &recipients).await?;
        Ok(recipients.len())
    }
}

/// First instant strictly after `now` whose time of day is `run_at`
pub fn next_run_after(now: DateTime<Utc>, run_at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(run_at).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Run `job` every day at `run_at` (UTC) until the task is aborted.
///
/// A failed tick is logged; the next tick is scheduled as usual.
pub fn spawn_daily(job: LateLoanJob, run_at: NaiveTime, clock: Arc<dyn Clock>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = clock.now();
            let next = next_run_after(now, run_at);
            tracing::debug!(next_run = %next, "Late loan job scheduled");
            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            match job.run_once().await {
                Ok(count) => tracing::info!(notified = count, "Late loan job finished"),
                Err(e) => tracing::error!("Late loan job failed: {}", e),
            }
        }
    })
}
