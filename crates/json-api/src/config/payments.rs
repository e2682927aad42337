//! Payments Config

use std::time::Duration;

use clap::Args;
use storefront_app::domain::payments::StripeConfig;

/// Payment gateway settings.
#[derive(Debug, Args)]
#[expect(
    clippy::struct_field_names,
    reason = "field names are the long CLI flag names."
)]
pub struct PaymentsConfig {
    /// Payment gateway API base address
    #[arg(long, env = "STRIPE_API_BASE", default_value = "https://api.stripe.com")]
    pub stripe_api_base: String,

    /// Payment gateway secret key
    #[arg(long, env = "STRIPE_SECRET_KEY", hide_env_values = true)]
    pub stripe_secret_key: String,

    /// Per-request gateway timeout in seconds
    #[arg(long, env = "STRIPE_TIMEOUT_SECONDS", default_value_t = 10_u64)]
    pub stripe_timeout_seconds: u64,
}

impl PaymentsConfig {
    /// Gateway client configuration.
    #[must_use]
    pub fn stripe_config(&self) -> StripeConfig {
        StripeConfig {
            api_base: self.stripe_api_base.clone(),
            secret_key: self.stripe_secret_key.clone(),
            timeout: Duration::from_secs(self.stripe_timeout_seconds),
        }
    }
}
