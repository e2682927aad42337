//! Confirm Payment Handler

use salvo::{
    oapi::extract::{JsonBody, PathParam},
    prelude::*,
};

use storefront_app::domain::payments::models::ClientSecret;

use crate::{
    checkout::{
        requests::ConfirmRequest,
        responses::{CheckoutResponse, render},
    },
    extensions::*,
};

/// Confirm the open payment session
///
/// On success the order has been created and the invoice sent, or queued when mail is down.
/// `awaiting_redirect` sends the customer to `redirect_url`; they come back through the return
/// endpoint.
#[endpoint(
    tags("checkout"),
    summary = "Confirm Payment",
    responses(
        (status_code = StatusCode::OK, description = "Payment captured and order created"),
        (status_code = StatusCode::ACCEPTED, description = "Awaiting redirect, or payment captured with order pending"),
        (status_code = StatusCode::PAYMENT_REQUIRED, description = "Payment declined"),
        (status_code = StatusCode::CONFLICT, description = "Confirmation in progress or session stale"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Payment gateway unavailable"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "checkout.confirm",
    skip(key, json, depot, res),
    fields(checkout_key = tracing::field::Empty)
)]
pub(crate) async fn handler(
    key: PathParam<String>,
    json: JsonBody<ConfirmRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CheckoutResponse>, StatusError> {
    let state = depot.state_or_500()?;
    let key = key.into_checkout_key()?;
    let request = json.into_inner();

    tracing::Span::current().record("checkout_key", tracing::field::display(&key));

    let outcome = state
        .checkout
        .confirm(
            &key,
            &ClientSecret::new(request.client_secret),
            request.return_url,
            request.payment_method,
        )
        .await;

    let (status, body) = render(&outcome);

    res.status_code(status);

    Ok(Json(body))
}
