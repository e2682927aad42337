//! Checkout Handlers

pub(crate) mod abandon;
pub(crate) mod confirm;
pub(crate) mod quote;
pub(crate) mod resume;
pub(crate) mod session;
