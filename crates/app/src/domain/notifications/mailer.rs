//! Notification channel.

use async_trait::async_trait;
use mockall::automock;

use crate::domain::notifications::errors::MailerError;

/// An invoice email with its rendered attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceEmail {
    pub to: String,
    pub subject: String,

    /// Plain-text order summary used as the message body
    pub summary: String,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
}

#[automock]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_invoice_email(&self, email: InvoiceEmail) -> Result<(), MailerError>;
}
