//! Notification errors.

use thiserror::Error;

use crate::domain::orders::models::OrderNumber;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("invalid mailbox {0}")]
    InvalidMailbox(String),

    #[error("message could not be built")]
    Message(#[source] lettre::error::Error),

    #[error("mail transport failed: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("order {0} has no email address on file")]
    NoRecipient(OrderNumber),

    #[error("unknown currency {0}")]
    UnknownCurrency(String),

    #[error("invoice amount out of range")]
    OutOfRange,

    #[error("invoice could not be rendered")]
    Render(#[source] storefront::invoice::InvoiceError),

    #[error("invoice could not be sent")]
    Mailer(#[from] MailerError),
}
