//! Server configuration module

use clap::Parser;
use storefront_app::context::AppConfig;
use thiserror::Error;

use crate::config::{
    checkout::CheckoutConfig,
    db::DatabaseConfig,
    mail::MailConfig,
    observability::{LoggingConfig, ObservabilityConfig},
    payments::PaymentsConfig,
    server::ServerRuntimeConfig,
};

pub(crate) mod checkout;
pub(crate) mod db;
pub(crate) mod mail;
pub(crate) mod observability;
pub(crate) mod payments;
pub(crate) mod server;

pub(crate) use observability::LogFormat;

/// Settings that parse but cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The checkout currency is not an ISO 4217 code.
    #[error("unknown checkout currency {0}")]
    UnknownCurrency(String),

    /// The tax rate is negative.
    #[error("tax rate must not be negative, got {0}")]
    NegativeTaxRate(rust_decimal::Decimal),
}

/// Storefront JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "storefront-json", about = "Storefront JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Observability (traces/metrics) settings.
    #[command(flatten)]
    pub observability: ObservabilityConfig,

    /// Application database settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Payment gateway settings.
    #[command(flatten)]
    pub payments: PaymentsConfig,

    /// Outgoing mail settings.
    #[command(flatten)]
    pub mail: MailConfig,

    /// Checkout pricing and continuation settings.
    #[command(flatten)]
    pub checkout: CheckoutConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }

    /// Settings for the application services.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkout settings are unusable.
    pub fn app_config(&self) -> Result<AppConfig, ConfigError> {
        Ok(AppConfig {
            database_url: self.database.database_url.clone(),
            migrate: self.database.migrate,
            payments: self.payments.stripe_config(),
            mail: self.mail.smtp_config(),
            checkout: self.checkout.settings()?,
            continuations_dir: self.checkout.continuations_dir.clone(),
            continuation_max_age: self.checkout.continuation_max_age(),
        })
    }
}
