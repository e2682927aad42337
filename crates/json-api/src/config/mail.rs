//! Mail Config

use clap::Args;
use storefront_app::domain::notifications::SmtpConfig;

/// Outgoing mail settings.
#[derive(Debug, Args)]
pub struct MailConfig {
    /// SMTP relay host
    #[arg(long, env = "SMTP_HOST")]
    pub smtp_host: String,

    /// SMTP relay port
    #[arg(long, env = "SMTP_PORT", default_value_t = 587)]
    pub smtp_port: u16,

    /// SMTP username
    #[arg(long, env = "SMTP_USERNAME")]
    pub smtp_username: Option<String>,

    /// SMTP password
    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// Connect without STARTTLS (local relays only)
    #[arg(long, env = "SMTP_INSECURE", default_value_t = false)]
    pub smtp_insecure: bool,

    /// Sender mailbox for invoices, e.g. `Shop <orders@example.com>`
    #[arg(long, env = "MAIL_FROM")]
    pub mail_from: String,
}

impl MailConfig {
    /// SMTP transport configuration.
    #[must_use]
    pub fn smtp_config(&self) -> SmtpConfig {
        SmtpConfig {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            starttls: !self.smtp_insecure,
            from: self.mail_from.clone(),
        }
    }
}
