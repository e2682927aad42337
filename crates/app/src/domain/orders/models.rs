//! Order Models

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    domain::{
        addresses::Address,
        payments::models::IntentId,
        products::models::{ProductUuid, StockDecrement},
    },
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Order line item UUID
pub type OrderLineItemUuid = TypedUuid<OrderLineItem>;

/// Fulfillment exception UUID
pub type FulfillmentExceptionUuid = TypedUuid<FulfillmentException>;

/// Crockford base32, without the easily confused I, L, O and U.
const ORDER_NUMBER_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const ORDER_NUMBER_SUFFIX_LEN: usize = 10;

/// Human-presentable order number, e.g. `ORD-20261015-7K3M9QX2PD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Generate a number for an order placed at `at`. The suffix comes from the random bits of
    /// a fresh v7 UUID.
    pub fn generate(at: Timestamp) -> Self {
        let mut bits = Uuid::now_v7().as_u128();
        let mut suffix = String::with_capacity(ORDER_NUMBER_SUFFIX_LEN);

        for _ in 0..ORDER_NUMBER_SUFFIX_LEN {
            suffix.push(char::from(ORDER_NUMBER_ALPHABET[(bits & 0x1f) as usize]));
            bits >>= 5;
        }

        Self(format!("ORD-{}-{suffix}", at.strftime("%Y%m%d")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Gateway reference of the payment an order was created for. Unique per order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentReference(String);

impl PaymentReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&IntentId> for PaymentReference {
    fn from(intent: &IntentId) -> Self {
        Self(intent.as_str().to_string())
    }
}

impl Display for PaymentReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Payment captured but the order could not be fully reconstructed; needs staff review
    Pending,
    Paid,
    Shipped,
    Delivered,
}

#[derive(Debug, Error)]
#[error("unknown order status {0}")]
pub struct UnknownOrderStatus(String);

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            other => Err(UnknownOrderStatus(other.to_string())),
        }
    }
}

/// Order Model
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub uuid: OrderUuid,
    pub number: OrderNumber,
    pub payment_reference: PaymentReference,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub shipping_address: Option<Address>,

    /// Amount charged in minor units
    pub total: u64,
    pub currency: String,
    pub status: OrderStatus,
    pub created_at: Timestamp,
}

/// Order line item Model
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineItem {
    pub uuid: OrderLineItemUuid,
    pub order_uuid: OrderUuid,
    pub product: ProductUuid,
    pub name: String,
    pub quantity: u32,

    /// Tax-inclusive unit price charged, in minor units
    pub price_at_purchase: u64,
    pub variant: Option<String>,
}

/// An order together with its line items.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub order: Order,
    pub lines: Vec<OrderLineItem>,
}

/// New Order Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub payment_reference: PaymentReference,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub shipping_address: Option<Address>,
    pub total: u64,
    pub currency: String,
    pub status: OrderStatus,
    pub lines: Vec<NewOrderLine>,
}

/// New order line Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderLine {
    pub product: ProductUuid,
    pub name: String,
    pub quantity: u32,
    pub price_at_purchase: u64,
    pub variant: Option<String>,
}

/// Stock decrement performed for one order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockOutcome {
    pub product: ProductUuid,
    pub requested: u32,
    pub result: StockDecrement,
}

/// Result of creating an order.
#[derive(Debug, Clone, PartialEq)]
pub struct Materialized {
    pub order: PlacedOrder,

    /// `false` when an order already existed for the payment reference and was returned as-is
    pub created: bool,

    /// Stock outcomes per line; empty when `created` is `false`
    pub stock: Vec<StockOutcome>,
}

impl Materialized {
    /// Lines whose stock could not be taken.
    pub fn oversold(&self) -> impl Iterator<Item = &StockOutcome> {
        self.stock.iter().filter(|s| !s.result.is_decremented())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentExceptionKind {
    InsufficientStock,
    UnknownProduct,
}

impl FulfillmentExceptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentExceptionKind::InsufficientStock => "insufficient_stock",
            FulfillmentExceptionKind::UnknownProduct => "unknown_product",
        }
    }
}

/// An order line that could not be fulfilled from stock and needs manual resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct FulfillmentException {
    pub uuid: FulfillmentExceptionUuid,
    pub order_uuid: OrderUuid,
    pub product: ProductUuid,
    pub kind: FulfillmentExceptionKind,
    pub requested: u32,
    pub available: Option<u32>,
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn order_number_has_date_and_suffix() -> TestResult {
        let at: Timestamp = "2026-10-15T12:00:00Z".parse()?;
        let number = OrderNumber::generate(at);

        let suffix = number
            .as_str()
            .strip_prefix("ORD-20261015-")
            .ok_or("missing prefix")?;

        assert_eq!(suffix.len(), 10, "{number}");
        assert!(
            suffix
                .bytes()
                .all(|b| ORDER_NUMBER_ALPHABET.contains(&b)),
            "{number}"
        );

        Ok(())
    }

    #[test]
    fn order_numbers_differ() {
        let at = Timestamp::now();

        assert_ne!(OrderNumber::generate(at), OrderNumber::generate(at));
    }

    #[test]
    fn order_status_round_trips_through_str() -> TestResult {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>()?, status);
        }

        assert!("lost".parse::<OrderStatus>().is_err());

        Ok(())
    }
}
