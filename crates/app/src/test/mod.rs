//! Test support

pub(crate) mod fakes;
pub(crate) mod helpers;

pub(crate) use context::TestContext;
