//! Coupon discounts
//!
//! A coupon either takes a percentage off or subtracts a fixed amount. Both are applied to the
//! tax-inclusive gross total by [`crate::pricing::price_items`].

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

/// Errors specific to discount calculations.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Discount terms carried by a resolved coupon.
#[derive(Debug, Copy, Clone)]
pub enum CouponDiscount<'a> {
    /// Take a percentage off the gross total (e.g. "10% off")
    PercentageOff(Percentage),

    /// Subtract a fixed amount from the gross total (e.g. "£5 off")
    AmountOff(Money<'a, Currency>),
}

impl<'a> CouponDiscount<'a> {
    /// The nominal discount this coupon grants against `gross`.
    ///
    /// Fixed amounts are returned as-is even when they exceed `gross`; clamping the payable
    /// total is the caller's concern.
    ///
    /// # Errors
    ///
    /// - [`DiscountError::PercentConversion`]: the percentage could not be applied in minor units.
    /// - [`DiscountError::Money`]: the fixed amount is in a different currency to `gross`.
    pub fn amount_against(
        &self,
        gross: &Money<'a, Currency>,
    ) -> Result<Money<'a, Currency>, DiscountError> {
        match self {
            CouponDiscount::PercentageOff(percent) => percent_of(gross, percent),
            CouponDiscount::AmountOff(amount) => {
                if amount.currency() != gross.currency() {
                    return Err(DiscountError::Money(MoneyError::CurrencyMismatch {
                        expected: gross.currency().iso_alpha_code,
                        actual: amount.currency().iso_alpha_code,
                    }));
                }

                Ok(*amount)
            }
        }
    }
}

/// Apply `percent` to `price`, rounding to the nearest minor unit.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the result cannot be represented.
pub fn percent_of<'a>(
    price: &Money<'a, Currency>,
    percent: &Percentage,
) -> Result<Money<'a, Currency>, DiscountError> {
    let minor = percent_of_minor(percent, price.to_minor_units())?;

    Ok(Money::from_minor(minor, price.currency()))
}

/// Calculate a percentage of a minor unit amount, rounding midpoints away from zero.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the multiplication overflows or the result
/// does not fit in an `i64`.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage crate doesn't actually expose the underlying Decimal
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}
