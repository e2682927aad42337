//! Payment Models

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

/// Gateway identifier of a payment intent. Doubles as the order's payment reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentId(String);

impl IntentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for IntentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Client-visible secret used to confirm an intent.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientSecret(String);

impl ClientSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The intent this secret belongs to. Secrets have the form `{intent_id}_secret_{suffix}`.
    pub fn intent_id(&self) -> Option<IntentId> {
        self.0
            .split_once("_secret_")
            .filter(|(id, suffix)| !id.is_empty() && !suffix.is_empty())
            .map(|(id, _suffix)| IntentId::new(id))
    }
}

impl Debug for ClientSecret {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("ClientSecret(..)")
    }
}

/// Gateway-side status of an intent, collapsed to what checkout acts on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    /// The customer still has something to do before the payment can be taken.
    RequiresAction,

    /// Confirmed and with the card network. May still succeed, so must not be paid again.
    Processing,
    Succeeded,
    Failed,
}

/// Context attached to an intent so a payment can be traced back to a checkout even when the
/// local continuation is gone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentMetadata {
    pub checkout_key: String,
    pub customer_name: String,
    pub customer_email: String,
}

/// A payment intent as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: IntentId,
    pub client_secret: ClientSecret,

    /// Amount in minor units
    pub amount: u64,

    /// Upper-case ISO 4217 code
    pub currency: String,
    pub status: IntentStatus,
    pub metadata: IntentMetadata,

    /// Where to send the customer to complete authentication, if required
    pub redirect_url: Option<String>,

    /// Gateway explanation of the last failed attempt
    pub failure_message: Option<String>,
}

/// Request to create a payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIntent {
    pub amount: u64,
    pub currency: String,

    /// Repeating a request with the same key returns the original intent
    pub idempotency_key: String,
    pub metadata: IntentMetadata,
}

/// Request to confirm a payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Where the gateway sends the customer back to after any redirect
    pub return_url: String,
    pub payment_method: Option<String>,
}

/// The intent opened for one checkout attempt. The amount never changes; a new total means a
/// new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSession {
    pub intent_id: IntentId,
    pub client_secret: ClientSecret,
    pub amount: u64,
    pub currency: String,
    pub status: IntentStatus,
}

impl From<&PaymentIntent> for PaymentSession {
    fn from(intent: &PaymentIntent) -> Self {
        Self {
            intent_id: intent.id.clone(),
            client_secret: intent.client_secret.clone(),
            amount: intent.amount,
            currency: intent.currency.clone(),
            status: intent.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_id_is_derived_from_client_secret() {
        let secret = ClientSecret::new("pi_3Nabc_secret_xyz");

        assert_eq!(secret.intent_id(), Some(IntentId::new("pi_3Nabc")));
    }

    #[test]
    fn malformed_client_secret_has_no_intent_id() {
        assert_eq!(ClientSecret::new("pi_3Nabc").intent_id(), None);
        assert_eq!(ClientSecret::new("_secret_xyz").intent_id(), None);
        assert_eq!(ClientSecret::new("pi_3Nabc_secret_").intent_id(), None);
    }

    #[test]
    fn client_secret_is_not_debug_printed() {
        let secret = ClientSecret::new("pi_1_secret_2");

        assert_eq!(format!("{secret:?}"), "ClientSecret(..)");
    }
}
