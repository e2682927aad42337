//! Cart validation errors.

use thiserror::Error;

use crate::domain::products::models::ProductUuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("cart is empty")]
    Empty,

    #[error("quantity for product {product} must be at least one")]
    ZeroQuantity { product: ProductUuid },

    #[error("only {available} of product {product} available, {requested} requested")]
    ExceedsStock {
        product: ProductUuid,
        requested: u32,
        available: u32,
    },

    #[error("price for product {product} is out of range")]
    PriceOutOfRange { product: ProductUuid },
}
