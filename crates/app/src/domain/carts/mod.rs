//! Carts
//!
//! Carts are owned by the client until checkout begins. They arrive with each checkout request
//! and are only validated and priced here, never stored.

pub mod errors;
pub mod models;

pub use errors::CartError;
pub use models::*;
