//! Product Models

use jiff::Timestamp;

use crate::uuids::TypedUuid;

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Product Model
#[derive(Debug, Clone)]
pub struct Product {
    pub uuid: ProductUuid,
    pub name: String,
    pub price: u64,
    pub stock_quantity: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New Product Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub name: String,
    pub price: u64,
    pub stock_quantity: u32,
}

/// Result of a conditional stock decrement.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StockDecrement {
    /// Stock was taken; `remaining` units are left.
    Decremented { remaining: u32 },

    /// Fewer than the requested units were in stock, so nothing was taken.
    Insufficient { available: u32 },

    /// The product is not in the catalogue.
    UnknownProduct,
}

impl StockDecrement {
    pub fn is_decremented(&self) -> bool {
        matches!(self, StockDecrement::Decremented { .. })
    }
}
