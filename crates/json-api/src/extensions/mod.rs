//! Extension traits

mod checkout_key;
mod depot;
mod result;

pub(crate) use checkout_key::CheckoutKeyExt as _;
pub(crate) use depot::DepotExt as _;
pub(crate) use result::ResultExt as _;
