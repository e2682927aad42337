//! Cart Models

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use storefront::items::LineItem;

use crate::domain::{carts::CartError, products::models::ProductUuid};

/// A single cart line as submitted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: ProductUuid,
    pub name: String,

    /// Pre-tax unit price in minor units
    pub unit_price: u64,
    pub quantity: u32,

    /// Stock level observed when the line was added to the cart
    pub stock_limit: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl CartLine {
    /// Name shown on invoices, including the variant if one was chosen.
    pub fn description(&self) -> String {
        match &self.variant {
            Some(variant) => format!("{} ({variant})", self.name),
            None => self.name.clone(),
        }
    }
}

/// Ordered cart contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn new(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    /// Check the cart can be checked out.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: an empty cart, a zero quantity or a quantity above the
    /// stock limit captured when the line was added.
    pub fn validate(&self) -> Result<(), CartError> {
        if self.lines.is_empty() {
            return Err(CartError::Empty);
        }

        for line in &self.lines {
            if line.quantity == 0 {
                return Err(CartError::ZeroQuantity {
                    product: line.product,
                });
            }

            if line.quantity > line.stock_limit {
                return Err(CartError::ExceedsStock {
                    product: line.product,
                    requested: line.quantity,
                    available: line.stock_limit,
                });
            }
        }

        Ok(())
    }

    /// Cart lines as priceable line items in `currency`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::PriceOutOfRange`] if a unit price cannot be represented.
    pub fn line_items(
        &self,
        currency: &'static Currency,
    ) -> Result<Vec<LineItem<'static>>, CartError> {
        self.lines
            .iter()
            .map(|line| {
                let minor = i64::try_from(line.unit_price).map_err(|_err| {
                    CartError::PriceOutOfRange {
                        product: line.product,
                    }
                })?;

                Ok(LineItem::new(
                    Money::from_minor(minor, currency),
                    line.quantity,
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use super::*;

    fn line(quantity: u32, stock_limit: u32) -> CartLine {
        CartLine {
            product: ProductUuid::new(),
            name: "Teapot".to_string(),
            unit_price: 25_00,
            quantity,
            stock_limit,
            variant: None,
        }
    }

    #[test]
    fn empty_cart_is_rejected() {
        assert_eq!(Cart::default().validate(), Err(CartError::Empty));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let cart = Cart::new(vec![line(0, 5)]);

        assert!(
            matches!(cart.validate(), Err(CartError::ZeroQuantity { .. })),
            "zero quantity should be rejected"
        );
    }

    #[test]
    fn quantity_above_stock_limit_is_rejected() {
        let cart = Cart::new(vec![line(3, 2)]);

        assert!(
            matches!(
                cart.validate(),
                Err(CartError::ExceedsStock {
                    requested: 3,
                    available: 2,
                    ..
                })
            ),
            "quantity above stock limit should be rejected"
        );
    }

    #[test]
    fn line_items_carry_price_and_quantity() -> TestResult {
        let cart = Cart::new(vec![line(2, 5)]);

        cart.validate()?;

        let items = cart.line_items(GBP)?;

        assert_eq!(items.len(), 1);
        assert_eq!(items.first().map(LineItem::quantity), Some(2));

        Ok(())
    }

    #[test]
    fn description_includes_variant() {
        let mut line = line(1, 1);
        line.variant = Some("Blue".to_string());

        assert_eq!(line.description(), "Teapot (Blue)");
    }
}
