//! Fulfillment notifications

pub mod errors;
pub mod mailer;
pub mod notifier;
pub mod smtp;

pub use errors::{MailerError, NotificationError};
pub use mailer::*;
pub use notifier::*;
pub use smtp::{SmtpConfig, SmtpMailer};
