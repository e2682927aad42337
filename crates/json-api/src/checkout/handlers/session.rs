//! Open Payment Session Handler

use salvo::{
    oapi::extract::{JsonBody, PathParam},
    prelude::*,
};

use storefront_app::domain::checkout::OpenSession;

use crate::{
    checkout::{
        requests::{SessionRequest, cart},
        responses::{CheckoutResponse, render},
    },
    extensions::*,
};

impl From<SessionRequest> for OpenSession {
    fn from(request: SessionRequest) -> Self {
        OpenSession {
            customer_name: request.customer_name,
            address: request.address.into(),
            cart: cart(request.lines),
            coupon_code: request.coupon_code,
        }
    }
}

/// Open a payment session
///
/// Validates the address, prices the cart and opens a payment intent for the final total. Any
/// session already open for the checkout is replaced.
#[endpoint(
    tags("checkout"),
    summary = "Open Payment Session",
    responses(
        (status_code = StatusCode::OK, description = "Session opened"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Address, cart or coupon rejected"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Payment gateway unavailable"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "checkout.session",
    skip(key, json, depot, res),
    fields(checkout_key = tracing::field::Empty)
)]
pub(crate) async fn handler(
    key: PathParam<String>,
    json: JsonBody<SessionRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CheckoutResponse>, StatusError> {
    let state = depot.state_or_500()?;
    let key = key.into_checkout_key()?;

    tracing::Span::current().record("checkout_key", tracing::field::display(&key));

    match state
        .checkout
        .open_session(&key, json.into_inner().into())
        .await
    {
        Ok(opened) => Ok(Json(CheckoutResponse::session_opened(&opened))),
        Err(outcome) => {
            let (status, body) = render(&outcome);

            res.status_code(status);

            Ok(Json(body))
        }
    }
}
