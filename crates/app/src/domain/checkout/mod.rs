//! Checkout
//!
//! Turns a priced cart into a captured payment, an order and an invoice notification. The
//! payment step may send the customer's browser away to the gateway and back, so everything
//! needed to finish is written to a [`crate::domain::continuations::ContinuationStore`] before
//! confirmation starts.

pub mod confirmation;
pub mod coupons;
mod key;
pub mod materializer;
pub mod outcomes;
pub mod workflow;

pub use confirmation::{ConfirmationPhase, PaymentConfirmationHandler, ReturnReference};
pub use coupons::{CouponRejection, CouponResolver, CouponTerms};
pub use key::{CheckoutKey, InvalidCheckoutKey};
pub use materializer::{MaterializationError, OrderMaterializer};
pub use outcomes::{CheckoutOutcome, ValidationError};
pub use workflow::*;
