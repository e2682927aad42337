//! Abandon Checkout Handler

use salvo::{oapi::extract::PathParam, prelude::*};

use crate::extensions::*;

/// Abandon a checkout
///
/// Forgets the open payment session and any saved continuation. Abandoning an unknown checkout
/// succeeds.
#[endpoint(
    tags("checkout"),
    summary = "Abandon Checkout",
    responses(
        (status_code = StatusCode::NO_CONTENT, description = "Checkout abandoned"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "checkout.abandon",
    skip(key, depot),
    fields(checkout_key = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    key: PathParam<String>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.state_or_500()?;
    let key = key.into_checkout_key()?;

    tracing::Span::current().record("checkout_key", tracing::field::display(&key));

    state
        .checkout
        .abandon(&key)
        .await
        .or_500("failed to abandon checkout")?;

    Ok(StatusCode::NO_CONTENT)
}
