//! Checkout key path parameter parsing.

use salvo::{oapi::extract::PathParam, prelude::StatusError};
use storefront_app::domain::checkout::CheckoutKey;

pub(crate) trait CheckoutKeyExt {
    fn into_checkout_key(self) -> Result<CheckoutKey, StatusError>;
}

impl CheckoutKeyExt for PathParam<String> {
    fn into_checkout_key(self) -> Result<CheckoutKey, StatusError> {
        self.into_inner()
            .parse::<CheckoutKey>()
            .map_err(|error| StatusError::bad_request().brief(error.to_string()))
    }
}
