//! Addresses

pub mod models;
mod validation;

pub use models::Address;
pub use validation::*;
