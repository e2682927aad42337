//! Coupon Resolver

use std::sync::Arc;

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::Serialize;
use storefront::discounts::CouponDiscount;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::coupons::{CouponsService, models::Coupon};

/// Why a coupon code was not applied.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum CouponRejection {
    #[error("this code is not recognised")]
    Unknown,

    #[error("this code is no longer active")]
    Inactive,

    /// The stored discount is unusable, e.g. a percentage above 100.
    #[error("this code cannot be used")]
    Invalid,

    /// The coupon could not be looked up.
    #[error("coupons cannot be checked right now")]
    Unavailable,
}

impl CouponRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponRejection::Unknown => "unknown",
            CouponRejection::Inactive => "inactive",
            CouponRejection::Invalid => "invalid",
            CouponRejection::Unavailable => "unavailable",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            CouponRejection::Unknown => "this code is not recognised",
            CouponRejection::Inactive => "this code is no longer active",
            CouponRejection::Invalid => "this code cannot be used",
            CouponRejection::Unavailable => "coupons cannot be checked right now",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CouponValue {
    /// Percentage points, in `(0, 100]`
    Percent(Decimal),

    /// Minor units, above zero
    Amount(i64),
}

/// Validated discount terms of an active coupon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponTerms {
    pub code: String,
    pub value: CouponValue,
}

impl CouponTerms {
    /// Check a stored coupon can be applied.
    ///
    /// # Errors
    ///
    /// Returns [`CouponRejection::Inactive`] for inactive coupons, and
    /// [`CouponRejection::Invalid`] unless exactly one of a percentage in `(0, 100]` or a positive
    /// amount is set.
    pub fn from_coupon(coupon: &Coupon) -> Result<Self, CouponRejection> {
        if !coupon.active {
            return Err(CouponRejection::Inactive);
        }

        let value = match (coupon.percent_off, coupon.amount_off) {
            (Some(percent), None) if percent > Decimal::ZERO && percent <= Decimal::ONE_HUNDRED => {
                CouponValue::Percent(percent)
            }
            (None, Some(amount)) if amount > 0 => CouponValue::Amount(amount),
            _ => return Err(CouponRejection::Invalid),
        };

        Ok(Self {
            code: coupon.code.clone(),
            value,
        })
    }

    /// Discount to hand to the pricing engine for a cart priced in `currency`.
    pub fn discount(&self, currency: &'static Currency) -> CouponDiscount<'static> {
        match self.value {
            CouponValue::Percent(points) => {
                CouponDiscount::PercentageOff(Percentage::from(points / Decimal::ONE_HUNDRED))
            }
            CouponValue::Amount(minor) => {
                CouponDiscount::AmountOff(Money::from_minor(minor, currency))
            }
        }
    }
}

/// Looks coupon codes up and checks they can be applied. Never modifies coupons.
#[derive(Clone)]
pub struct CouponResolver {
    coupons: Arc<dyn CouponsService>,
}

impl std::fmt::Debug for CouponResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CouponResolver").finish_non_exhaustive()
    }
}

impl CouponResolver {
    pub fn new(coupons: Arc<dyn CouponsService>) -> Self {
        Self { coupons }
    }

    /// Resolve `code`, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns the [`CouponRejection`] explaining why the code cannot be applied.
    #[tracing::instrument(name = "checkout.coupons.resolve", skip(self), err(Debug))]
    pub async fn resolve(&self, code: &str) -> Result<CouponTerms, CouponRejection> {
        let code = code.trim();

        if code.is_empty() {
            return Err(CouponRejection::Unknown);
        }

        let coupon = match self.coupons.find_coupon(code).await {
            Ok(Some(coupon)) => coupon,
            Ok(None) => return Err(CouponRejection::Unknown),
            Err(error) => {
                warn!(%error, "coupon lookup failed");

                return Err(CouponRejection::Unavailable);
            }
        };

        let terms = CouponTerms::from_coupon(&coupon)?;

        info!(coupon_uuid = %coupon.uuid, "resolved coupon");

        Ok(terms)
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use mockall::predicate::eq;
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use crate::domain::coupons::{CouponsServiceError, MockCouponsService, models::CouponUuid};

    use super::*;

    fn coupon(percent_off: Option<Decimal>, amount_off: Option<i64>, active: bool) -> Coupon {
        Coupon {
            uuid: CouponUuid::new(),
            code: "SAVE10".to_string(),
            percent_off,
            amount_off,
            active,
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        }
    }

    fn resolver_returning(found: Option<Coupon>) -> CouponResolver {
        let mut coupons = MockCouponsService::new();

        coupons
            .expect_find_coupon()
            .with(eq("save10"))
            .returning(move |_| Ok(found.clone()));

        CouponResolver::new(Arc::new(coupons))
    }

    #[tokio::test]
    async fn resolve_active_percentage_coupon() -> TestResult {
        let resolver = resolver_returning(Some(coupon(Some(Decimal::new(10, 0)), None, true)));

        let terms = resolver.resolve(" save10 ").await?;

        assert_eq!(terms.value, CouponValue::Percent(Decimal::new(10, 0)));

        Ok(())
    }

    #[test]
    fn rejection_displays_customer_message() {
        for rejection in [
            CouponRejection::Unknown,
            CouponRejection::Inactive,
            CouponRejection::Invalid,
            CouponRejection::Unavailable,
        ] {
            assert_eq!(rejection.to_string(), rejection.message());
        }
    }

    #[tokio::test]
    async fn resolve_unknown_code_is_rejected() {
        let resolver = resolver_returning(None);

        assert_eq!(
            resolver.resolve("save10").await,
            Err(CouponRejection::Unknown)
        );
    }

    #[tokio::test]
    async fn resolve_inactive_code_is_rejected() {
        let resolver = resolver_returning(Some(coupon(Some(Decimal::new(10, 0)), None, false)));

        assert_eq!(
            resolver.resolve("save10").await,
            Err(CouponRejection::Inactive)
        );
    }

    #[tokio::test]
    async fn resolve_lookup_failure_is_unavailable() {
        let mut coupons = MockCouponsService::new();

        coupons
            .expect_find_coupon()
            .returning(|_| Err(CouponsServiceError::NotFound));

        let resolver = CouponResolver::new(Arc::new(coupons));

        assert_eq!(
            resolver.resolve("save10").await,
            Err(CouponRejection::Unavailable)
        );
    }

    #[tokio::test]
    async fn resolve_blank_code_never_queries() {
        let mut coupons = MockCouponsService::new();

        coupons.expect_find_coupon().never();

        let resolver = CouponResolver::new(Arc::new(coupons));

        assert_eq!(resolver.resolve("  ").await, Err(CouponRejection::Unknown));
    }

    #[test]
    fn from_coupon_rejects_unusable_values() {
        let cases = [
            coupon(Some(Decimal::new(101, 0)), None, true),
            coupon(Some(Decimal::ZERO), None, true),
            coupon(None, Some(0), true),
            coupon(None, Some(-5_00), true),
            coupon(None, None, true),
            coupon(Some(Decimal::new(10, 0)), Some(5_00), true),
        ];

        for case in cases {
            assert_eq!(
                CouponTerms::from_coupon(&case),
                Err(CouponRejection::Invalid),
                "{case:?} should be invalid"
            );
        }
    }

    #[test]
    fn fixed_amount_discount_uses_cart_currency() -> TestResult {
        let terms = CouponTerms::from_coupon(&coupon(None, Some(75_00), true))?;

        assert!(
            matches!(
                terms.discount(GBP),
                CouponDiscount::AmountOff(amount) if amount == Money::from_minor(75_00, GBP)
            ),
            "expected 75.00 off"
        );

        Ok(())
    }
}
