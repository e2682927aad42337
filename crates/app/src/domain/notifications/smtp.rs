//! SMTP mailer.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::info;

use crate::domain::notifications::{
    errors::MailerError,
    mailer::{InvoiceEmail, Mailer},
};

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,

    /// Upgrade the connection with STARTTLS. Only disable for local relays.
    pub starttls: bool,

    /// Sender mailbox, e.g. `Shop <orders@example.com>`
    pub from: String,
}

/// Sends invoice emails through an SMTP relay.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    /// Build the transport. No connection is made until the first send.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay host or sender mailbox is invalid.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailerError> {
        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| MailerError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let mut builder = builder.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|_err| MailerError::InvalidMailbox(config.from.clone()))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[tracing::instrument(
        name = "notifications.smtp.send_invoice_email",
        skip(self, email),
        fields(subject = %email.subject),
        err
    )]
    async fn send_invoice_email(&self, email: InvoiceEmail) -> Result<(), MailerError> {
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|_err| MailerError::InvalidMailbox(email.to.clone()))?;

        let attachment = Attachment::new(email.attachment_name)
            .body(email.attachment, ContentType::TEXT_PLAIN);

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(email.summary))
                    .singlepart(attachment),
            )
            .map_err(MailerError::Message)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailerError::Transport(e.to_string()))?;

        info!("invoice email handed to relay");

        Ok(())
    }
}
