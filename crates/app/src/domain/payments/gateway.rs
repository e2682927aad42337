//! Payment gateway.

use async_trait::async_trait;
use mockall::automock;

use crate::domain::payments::{
    errors::GatewayError,
    models::{ClientSecret, Confirmation, NewIntent, PaymentIntent},
};

#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open an intent to capture `intent.amount`.
    async fn create_intent(&self, intent: NewIntent) -> Result<PaymentIntent, GatewayError>;

    /// Confirm the intent `secret` belongs to. The returned intent may require a redirect.
    async fn confirm_intent(
        &self,
        secret: &ClientSecret,
        confirmation: Confirmation,
    ) -> Result<PaymentIntent, GatewayError>;

    /// Current state of the intent `secret` belongs to.
    async fn retrieve_intent(&self, secret: &ClientSecret) -> Result<PaymentIntent, GatewayError>;
}
