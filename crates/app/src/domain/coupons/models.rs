//! Coupon Models

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::uuids::TypedUuid;

/// Coupon UUID
pub type CouponUuid = TypedUuid<Coupon>;

/// Coupon as stored. Exactly one of `percent_off` and `amount_off` is expected to be set, but
/// that is only enforced when the coupon is resolved at checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct Coupon {
    pub uuid: CouponUuid,
    pub code: String,

    /// Percentage points off, e.g. `10` for 10%
    pub percent_off: Option<Decimal>,

    /// Fixed amount off in minor units
    pub amount_off: Option<i64>,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New Coupon Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewCoupon {
    pub uuid: CouponUuid,
    pub code: String,
    pub percent_off: Option<Decimal>,
    pub amount_off: Option<i64>,
    pub active: bool,
}
