//! Payment Return Handler

use salvo::{
    oapi::extract::{PathParam, QueryParam},
    prelude::*,
};

use storefront_app::domain::{
    checkout::ReturnReference,
    payments::models::{ClientSecret, IntentId},
};

use crate::{
    checkout::responses::{CheckoutResponse, render},
    extensions::*,
};

/// Finish a checkout after the customer returns from the payment gateway
///
/// The gateway is only asked for the payment status; nothing is charged here.
#[endpoint(
    tags("checkout"),
    summary = "Return From Payment",
    responses(
        (status_code = StatusCode::OK, description = "Payment captured and order created"),
        (status_code = StatusCode::ACCEPTED, description = "Payment captured, order pending"),
        (status_code = StatusCode::PAYMENT_REQUIRED, description = "Payment declined or not completed"),
        (status_code = StatusCode::CONFLICT, description = "Already being processed or reference stale"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Payment gateway unavailable"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "checkout.resume",
    skip(key, payment_intent, payment_intent_client_secret, depot, res),
    fields(checkout_key = tracing::field::Empty)
)]
pub(crate) async fn handler(
    key: PathParam<String>,
    payment_intent: QueryParam<String, true>,
    payment_intent_client_secret: QueryParam<String, true>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CheckoutResponse>, StatusError> {
    let state = depot.state_or_500()?;
    let key = key.into_checkout_key()?;

    tracing::Span::current().record("checkout_key", tracing::field::display(&key));

    let reference = ReturnReference {
        intent_id: IntentId::new(payment_intent.into_inner()),
        client_secret: ClientSecret::new(payment_intent_client_secret.into_inner()),
    };

    let outcome = state.checkout.resume(&key, &reference).await;

    let (status, body) = render(&outcome);

    res.status_code(status);

    Ok(Json(body))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use storefront_app::domain::{
        continuations::ContinuationStoreError,
        payments::{GatewayError, models::IntentStatus},
    };

    use crate::test_helpers::{Mocks, checkout_service, existing_order, intent};

    use super::*;

    fn make_service(mocks: Mocks) -> Service {
        checkout_service(mocks, Router::with_path("checkout/{key}/return").get(handler))
    }

    const RETURN_URL: &str = "http://example.com/checkout/chk_1/return?payment_intent=pi_1&payment_intent_client_secret=pi_1_secret_test";

    #[tokio::test]
    async fn test_return_after_authentication_creates_order() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .gateway
            .expect_retrieve_intent()
            .once()
            .withf(|secret| secret.as_str() == "pi_1_secret_test")
            .return_once(|_| Ok(intent("pi_1", IntentStatus::Succeeded)));

        mocks.gateway.expect_confirm_intent().never();
        mocks.gateway.expect_create_intent().never();

        mocks.continuations.expect_load().once().returning(|_| Ok(None));

        mocks
            .orders
            .expect_create_order()
            .once()
            .withf(|order| order.payment_reference.as_str() == "pi_1" && order.lines.is_empty())
            .return_once(|_| Ok(existing_order("pi_1", "ORD-20261015-0002")));

        let mut res = TestClient::get(RETURN_URL)
            .send(&make_service(mocks))
            .await;

        let body: CheckoutResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.status, "success");
        assert_eq!(body.order_number.as_deref(), Some("ORD-20261015-0002"));

        Ok(())
    }

    #[tokio::test]
    async fn test_return_with_failed_payment_returns_402() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.gateway.expect_retrieve_intent().once().return_once(|_| {
            let mut failed = intent("pi_1", IntentStatus::Failed);
            failed.failure_message = Some("Your card was declined.".to_string());

            Ok(failed)
        });

        mocks.continuations.expect_clear().once().returning(|_| Ok(()));
        mocks.orders.expect_create_order().never();

        let mut res = TestClient::get(RETURN_URL)
            .send(&make_service(mocks))
            .await;

        let body: CheckoutResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::PAYMENT_REQUIRED));
        assert_eq!(body.status, "payment_declined");

        Ok(())
    }

    #[tokio::test]
    async fn test_return_while_payment_processing_returns_409() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .gateway
            .expect_retrieve_intent()
            .once()
            .return_once(|_| Ok(intent("pi_1", IntentStatus::Processing)));

        mocks.continuations.expect_clear().never();
        mocks.orders.expect_create_order().never();

        let mut res = TestClient::get(RETURN_URL)
            .send(&make_service(mocks))
            .await;

        let body: CheckoutResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));
        assert_eq!(body.status, "in_progress");

        Ok(())
    }

    #[tokio::test]
    async fn test_return_with_unreadable_continuation_reports_pending_order() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .gateway
            .expect_retrieve_intent()
            .once()
            .return_once(|_| Ok(intent("pi_1", IntentStatus::Succeeded)));

        mocks.continuations.expect_load().once().returning(|_| {
            Err(ContinuationStoreError::Io(std::io::Error::other(
                "input/output error",
            )))
        });
        mocks.continuations.expect_clear().never();
        mocks.orders.expect_create_order().never();

        let mut res = TestClient::get(RETURN_URL)
            .send(&make_service(mocks))
            .await;

        let body: CheckoutResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::ACCEPTED));
        assert_eq!(body.status, "payment_captured_order_pending");
        assert_eq!(body.payment_reference.as_deref(), Some("pi_1"));

        Ok(())
    }

    #[tokio::test]
    async fn test_return_gateway_unreachable_returns_503() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .gateway
            .expect_retrieve_intent()
            .once()
            .return_once(|_| Err(GatewayError::Unavailable("connection reset".to_string())));

        mocks.orders.expect_create_order().never();

        let res = TestClient::get(RETURN_URL)
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::SERVICE_UNAVAILABLE));

        Ok(())
    }

    #[tokio::test]
    async fn test_return_with_mismatched_reference_is_stale() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.gateway.expect_retrieve_intent().never();

        let mut res = TestClient::get(
            "http://example.com/checkout/chk_1/return?payment_intent=pi_2&payment_intent_client_secret=pi_1_secret_test",
        )
        .send(&make_service(mocks))
        .await;

        let body: CheckoutResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));
        assert_eq!(body.status, "stale_session");

        Ok(())
    }

    #[tokio::test]
    async fn test_return_without_reference_returns_400() -> TestResult {
        let res = TestClient::get("http://example.com/checkout/chk_1/return")
            .send(&make_service(Mocks::default()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
