//! Prices
//!
//! Checkout pricing is deliberately ordered: tax is added to the subtotal first, then the coupon
//! discount is taken from the tax-inclusive gross total. Changing that order changes what
//! customers are charged.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, MoneyError, iso};
use thiserror::Error;

use crate::{
    discounts::{CouponDiscount, DiscountError, percent_of},
    items::LineItem,
};

/// Errors that can occur while pricing a cart.
#[derive(Debug, Error)]
pub enum PricingError {
    /// No items were provided, so currency could not be determined.
    #[error("no items provided; cannot determine currency")]
    NoItems,

    /// A line total or running total exceeded the representable range.
    #[error("price overflowed minor units")]
    Overflow,

    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl From<DiscountError> for PricingError {
    fn from(err: DiscountError) -> Self {
        match err {
            DiscountError::PercentConversion => PricingError::PercentConversion,
            DiscountError::Money(err) => PricingError::Money(err),
        }
    }
}

/// Sales tax applied to every line.
#[derive(Debug, Copy, Clone)]
pub struct TaxRate(Percentage);

impl TaxRate {
    /// Create a tax rate from a fraction, e.g. `0.2` for 20%.
    pub fn new(rate: Decimal) -> Self {
        Self(Percentage::from(rate))
    }

    /// Underlying percentage
    pub fn percentage(&self) -> &Percentage {
        &self.0
    }
}

impl Default for TaxRate {
    /// UK standard rate VAT
    fn default() -> Self {
        Self::new(Decimal::new(20, 2))
    }
}

/// Result of pricing a cart.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PriceBreakdown<'a> {
    /// Sum of line totals before tax
    pub subtotal: Money<'a, iso::Currency>,

    /// Tax on the subtotal
    pub tax: Money<'a, iso::Currency>,

    /// Subtotal plus tax
    pub gross_total: Money<'a, iso::Currency>,

    /// Nominal coupon discount against the gross total. May exceed it for fixed coupons.
    pub discount: Money<'a, iso::Currency>,

    /// Amount to charge, never below zero
    pub final_total: Money<'a, iso::Currency>,
}

impl PriceBreakdown<'_> {
    /// Whether there is anything left to charge after the discount.
    pub fn is_chargeable(&self) -> bool {
        self.final_total.to_minor_units() > 0
    }
}

/// Price `items` at `tax_rate`, applying the optional coupon to the gross total.
///
/// # Errors
///
/// - [`PricingError::NoItems`]: No items were provided, so currency could not be determined.
/// - [`PricingError::Overflow`]: A line total did not fit in minor units.
/// - [`PricingError::PercentConversion`]: Tax or a percentage coupon could not be applied.
/// - [`PricingError::Money`]: Items or coupon use different currencies.
pub fn price_items<'a>(
    items: &[LineItem<'a>],
    coupon: Option<&CouponDiscount<'a>>,
    tax_rate: &TaxRate,
) -> Result<PriceBreakdown<'a>, PricingError> {
    let first = items.first().ok_or(PricingError::NoItems)?;
    let currency = first.unit_price().currency();

    let subtotal = items
        .iter()
        .try_fold(Money::from_minor(0, currency), |acc, item| {
            let line_total = item.line_total().ok_or(PricingError::Overflow)?;

            acc.add(line_total).map_err(PricingError::from)
        })?;

    let tax = percent_of(&subtotal, tax_rate.percentage())?;
    let gross_total = subtotal.add(tax)?;

    let discount = match coupon {
        Some(coupon) => coupon.amount_against(&gross_total)?,
        None => Money::from_minor(0, currency),
    };

    let remaining = gross_total.sub(discount)?;

    let final_total = if remaining.to_minor_units() < 0 {
        Money::from_minor(0, currency)
    } else {
        remaining
    };

    Ok(PriceBreakdown {
        subtotal,
        tax,
        gross_total,
        discount,
        final_total,
    })
}

/// Tax-inclusive price of a single unit, as recorded against order lines.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the tax cannot be applied.
pub fn tax_inclusive<'a>(
    unit_price: &Money<'a, iso::Currency>,
    tax_rate: &TaxRate,
) -> Result<Money<'a, iso::Currency>, PricingError> {
    let tax = percent_of(unit_price, tax_rate.percentage())?;

    Ok(unit_price.add(tax)?)
}
