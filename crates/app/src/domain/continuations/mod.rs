//! Checkout Continuations
//!
//! A continuation is written before the customer may be sent away to the payment gateway and is
//! read back when they return. It is the only state that survives the round trip.

pub mod errors;
pub mod file;
pub mod models;
pub mod store;

pub use errors::ContinuationStoreError;
pub use file::FileContinuationStore;
pub use models::CheckoutContinuation;
pub use store::*;
