//! Quote Handler

use salvo::{oapi::extract::JsonBody, prelude::*};

use crate::{
    checkout::{
        requests::{QuoteRequest, cart},
        responses::{CheckoutResponse, render},
    },
    extensions::*,
};

/// Price a cart
///
/// A coupon that cannot be applied is reported in `coupon_rejection` and the cart is priced
/// without it.
#[endpoint(
    tags("checkout"),
    summary = "Quote Cart",
    responses(
        (status_code = StatusCode::OK, description = "Cart priced"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Cart is invalid"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<QuoteRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CheckoutResponse>, StatusError> {
    let state = depot.state_or_500()?;
    let request = json.into_inner();

    let quote = state
        .checkout
        .quote(&cart(request.lines), request.coupon_code.as_deref())
        .await;

    match quote {
        Ok(quote) => Ok(Json(CheckoutResponse::quoted(&quote))),
        Err(outcome) => {
            let (status, body) = render(&outcome);

            res.status_code(status);

            Ok(Json(body))
        }
    }
}
