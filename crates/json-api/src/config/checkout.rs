//! Checkout Config

use std::path::PathBuf;

use clap::Args;
use jiff::SignedDuration;
use rust_decimal::Decimal;
use rusty_money::iso;
use storefront::pricing::TaxRate;
use storefront_app::domain::checkout::CheckoutSettings;

use super::ConfigError;

/// Checkout pricing and continuation settings.
#[derive(Debug, Args)]
pub struct CheckoutConfig {
    /// ISO 4217 currency every checkout is priced in
    #[arg(long, env = "CHECKOUT_CURRENCY", default_value = "GBP")]
    pub checkout_currency: String,

    /// Tax rate in percent
    #[arg(long, env = "TAX_RATE", default_value = "20", allow_hyphen_values = true)]
    pub tax_rate: Decimal,

    /// Directory continuations are written to
    #[arg(
        long,
        env = "CONTINUATIONS_DIR",
        default_value = "var/continuations"
    )]
    pub continuations_dir: PathBuf,

    /// Hours after which an unfinished continuation, payment session or redirect is discarded
    #[arg(long, env = "CONTINUATION_MAX_AGE_HOURS", default_value_t = 24_i64)]
    pub continuation_max_age_hours: i64,
}

impl CheckoutConfig {
    pub(crate) fn settings(&self) -> Result<CheckoutSettings, ConfigError> {
        let currency = iso::find(&self.checkout_currency)
            .ok_or_else(|| ConfigError::UnknownCurrency(self.checkout_currency.clone()))?;

        if self.tax_rate.is_sign_negative() {
            return Err(ConfigError::NegativeTaxRate(self.tax_rate));
        }

        Ok(CheckoutSettings {
            currency,
            tax_rate: TaxRate::new(self.tax_rate / Decimal::ONE_HUNDRED),
            session_max_age: self.continuation_max_age(),
        })
    }

    pub(crate) fn continuation_max_age(&self) -> SignedDuration {
        SignedDuration::from_hours(self.continuation_max_age_hours)
    }
}
