//! Checkout request bodies

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::{
    addresses::Address,
    carts::{Cart, CartLine},
    products::models::ProductUuid,
};

/// Cart line as held by the checkout UI
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartLineRequest {
    /// Product UUID
    pub product: Uuid,

    /// Product name shown on the invoice
    pub name: String,

    /// Unit price in minor units, excluding tax
    pub unit_price: u64,

    pub quantity: u32,

    /// Stock level when the line was added to the cart
    pub stock_limit: u32,

    #[serde(default)]
    pub variant: Option<String>,
}

impl From<CartLineRequest> for CartLine {
    fn from(line: CartLineRequest) -> Self {
        CartLine {
            product: ProductUuid::from_uuid(line.product),
            name: line.name,
            unit_price: line.unit_price,
            quantity: line.quantity,
            stock_limit: line.stock_limit,
            variant: line.variant,
        }
    }
}

pub(crate) fn cart(lines: Vec<CartLineRequest>) -> Cart {
    Cart::new(lines.into_iter().map(CartLine::from).collect())
}

/// Shipping address
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct AddressRequest {
    pub name: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub postcode: String,
    pub country: String,
    pub phone: String,
    pub email: String,
}

impl From<AddressRequest> for Address {
    fn from(address: AddressRequest) -> Self {
        Address {
            name: address.name,
            line1: address.line1,
            line2: address.line2,
            city: address.city,
            postcode: address.postcode,
            country: address.country,
            phone: address.phone,
            email: address.email,
        }
    }
}

/// Quote Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct QuoteRequest {
    pub lines: Vec<CartLineRequest>,

    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// Open Session Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SessionRequest {
    pub customer_name: String,
    pub address: AddressRequest,
    pub lines: Vec<CartLineRequest>,

    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// Confirm Payment Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ConfirmRequest {
    /// Client secret of the session being confirmed
    pub client_secret: String,

    /// Page the gateway returns the customer to after authentication
    pub return_url: String,

    #[serde(default)]
    pub payment_method: Option<String>,
}
