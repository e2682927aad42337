//! Coupons service.

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::coupons::{
        errors::CouponsServiceError,
        models::{Coupon, NewCoupon},
        repository::PgCouponsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgCouponsService {
    db: Db,
    repository: PgCouponsRepository,
}

impl PgCouponsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgCouponsRepository::new(),
        }
    }
}

#[async_trait]
impl CouponsService for PgCouponsService {
    #[tracing::instrument(
        name = "coupons.service.find_coupon",
        skip(self),
        fields(found = tracing::field::Empty),
        err
    )]
    async fn find_coupon(&self, code: &str) -> Result<Option<Coupon>, CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        let coupon = self.repository.find_coupon(&mut tx, code).await?;

        tx.commit().await?;

        tracing::Span::current().record("found", coupon.is_some());

        Ok(coupon)
    }

    #[tracing::instrument(
        name = "coupons.service.create_coupon",
        skip(self, coupon),
        fields(coupon_uuid = %coupon.uuid),
        err
    )]
    async fn create_coupon(&self, coupon: NewCoupon) -> Result<Coupon, CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self.repository.create_coupon(&mut tx, coupon).await?;

        tx.commit().await?;

        info!(coupon_uuid = %created.uuid, "created coupon");

        Ok(created)
    }
}

#[automock]
#[async_trait]
pub trait CouponsService: Send + Sync {
    /// Find a coupon by code, ignoring case.
    async fn find_coupon(&self, code: &str) -> Result<Option<Coupon>, CouponsServiceError>;

    /// Create a coupon. Codes are unique regardless of case.
    async fn create_coupon(&self, coupon: NewCoupon) -> Result<Coupon, CouponsServiceError>;
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{domain::coupons::models::CouponUuid, test::TestContext};

    use super::*;

    fn new_coupon(code: &str) -> NewCoupon {
        NewCoupon {
            uuid: CouponUuid::new(),
            code: code.to_string(),
            percent_off: Some(Decimal::TEN),
            amount_off: None,
            active: true,
        }
    }

    #[tokio::test]
    async fn find_coupon_ignores_case() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.coupons.create_coupon(new_coupon("Spring10")).await?;

        let coupon = ctx.coupons.find_coupon("SPRING10").await?;

        assert!(
            coupon.is_some_and(|c| c.percent_off == Some(Decimal::TEN)),
            "coupon should be found regardless of case"
        );

        Ok(())
    }

    #[tokio::test]
    async fn find_coupon_unknown_code_returns_none() -> TestResult {
        let ctx = TestContext::new().await;

        assert!(ctx.coupons.find_coupon("NOPE").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn codes_differing_only_in_case_conflict() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.coupons.create_coupon(new_coupon("SAVE5")).await?;

        let result = ctx.coupons.create_coupon(new_coupon("save5")).await;

        assert!(
            matches!(result, Err(CouponsServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }
}
