//! Payments
//!
//! Payment intents live at the gateway. This module talks to the gateway and tracks which intent
//! is current for each checkout.

pub mod errors;
pub mod gateway;
pub mod models;
pub mod sessions;
pub mod stripe;

pub use errors::{GatewayError, SessionError};
pub use gateway::*;
pub use sessions::PaymentSessionManager;
pub use stripe::{StripeConfig, StripeGateway};
