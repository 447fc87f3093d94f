//! Email service for late-return notices

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::{str::FromStr, sync::Arc};

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
};

/// Subject of every late-return notice
pub const LATE_RETURN_SUBJECT: &str = "Late book return";

/// Outbound mail delivery
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: Message) -> AppResult<()>;
}

/// SMTP delivery through lettre
#[derive(Clone)]
pub struct SmtpMailTransport {
    mailer: SmtpTransport,
}

impl SmtpMailTransport {
    pub fn new(config: &EmailConfig) -> AppResult<Self> {
        let mailer_builder = if config.smtp_use_tls {
            SmtpTransport::starttls_relay(&config.smtp_host)
                .map_err(|e| AppError::Email(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&config.smtp_host)
        }
        .port(config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) =
            (&config.smtp_username, &config.smtp_password)
        {
            mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer_builder
        };

        Ok(Self {
            mailer: mailer_builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, email: Message) -> AppResult<()> {
        let mailer = self.mailer.clone();
        // lettre's SmtpTransport blocks on network I/O
        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::Internal(format!("Email task failed: {}", e)))?
            .map_err(|e| AppError::Email(format!("Failed to send email: {}", e)))?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
    transport: Arc<dyn MailTransport>,
}

impl EmailService {
    pub fn new(config: EmailConfig, transport: Arc<dyn MailTransport>) -> Self {
        Self { config, transport }
    }

    /// Send one late-return notice addressed to every recipient.
    ///
    /// The batch succeeds or fails as a whole.
    pub async fn send_emails(&self, message: &str, recipients: &[String]) -> AppResult<()> {
        let email = self.build_message(message, recipients)?;
        self.transport.send(email).await?;
        tracing::info!(recipients = recipients.len(), "Late return notice sent");
        Ok(())
    }

    fn build_message(&self, body: &str, recipients: &[String]) -> AppResult<Message> {
        if recipients.is_empty() {
            return Err(AppError::Email("No recipients".to_string()));
        }

        let from_mailbox = match &self.config.smtp_from_name {
            Some(name) => Mailbox::from_str(&format!("{} <{}>", name, self.config.smtp_from)),
            None => Mailbox::from_str(&self.config.smtp_from),
        }
        .map_err(|e| AppError::Email(format!("Invalid from address: {}", e)))?;

        let mut builder = Message::builder()
            .from(from_mailbox)
            .subject(LATE_RETURN_SUBJECT);
        for recipient in recipients {
            let to_mailbox = Mailbox::from_str(recipient)
                .map_err(|e| AppError::Email(format!("Invalid to address {}: {}", recipient, e)))?;
            builder = builder.to(to_mailbox);
        }

        builder
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Email(format!("Failed to build email: {}", e)))
    }
}
