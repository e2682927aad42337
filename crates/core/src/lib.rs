//! Storefront
//!
//! Pure pricing for the storefront checkout: cart line totals, tax, coupon discounts and the
//! invoice artifact sent to customers once an order exists. Nothing in this crate performs I/O
//! beyond writing a rendered invoice into a caller supplied writer.

pub mod discounts;
pub mod invoice;
pub mod items;
pub mod pricing;
