//! Storefront Domain Concerns

pub mod addresses;
pub mod carts;
pub mod checkout;
pub mod continuations;
pub mod coupons;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod products;
