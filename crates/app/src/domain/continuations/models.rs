//! Continuation Models

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::domain::{
    addresses::Address, carts::Cart, checkout::CheckoutKey, payments::models::IntentId,
};

/// Everything needed to materialize an order after a redirect round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutContinuation {
    pub key: CheckoutKey,

    /// Intent the continuation was written for. A return for any other intent ignores it.
    pub intent_id: IntentId,
    pub customer_name: String,
    pub address: Address,
    pub cart: Cart,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,

    /// Final amount charged, in minor units
    pub total: u64,
    pub currency: String,
    pub created_at: Timestamp,
}
