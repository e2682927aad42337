//! Items

use rusty_money::{Money, iso};

/// A priced cart line: a unit price and how many units are being bought.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineItem<'a> {
    unit_price: Money<'a, iso::Currency>,
    quantity: u32,
}

impl<'a> LineItem<'a> {
    /// Creates a new line with the given unit price and quantity
    pub fn new(unit_price: Money<'a, iso::Currency>, quantity: u32) -> Self {
        Self {
            unit_price,
            quantity,
        }
    }

    /// Returns the pre-tax price of a single unit
    pub fn unit_price(&self) -> &Money<'a, iso::Currency> {
        &self.unit_price
    }

    /// Returns the number of units on this line
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price multiplied by quantity, or `None` if the product overflows minor units.
    pub fn line_total(&self) -> Option<Money<'a, iso::Currency>> {
        self.unit_price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
            .map(|minor| Money::from_minor(minor, self.unit_price.currency()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total_multiplies_unit_price_by_quantity() {
        let line = LineItem::new(Money::from_minor(25_00, iso::GBP), 2);

        assert_eq!(line.line_total(), Some(Money::from_minor(50_00, iso::GBP)));
    }

    #[test]
    fn zero_quantity_line_totals_zero() {
        let line = LineItem::new(Money::from_minor(9_99, iso::GBP), 0);

        assert_eq!(line.line_total(), Some(Money::from_minor(0, iso::GBP)));
    }

    #[test]
    fn overflowing_line_total_is_none() {
        let line = LineItem::new(Money::from_minor(i64::MAX, iso::GBP), 2);

        assert_eq!(line.line_total(), None);
    }
}
