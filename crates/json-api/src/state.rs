//! State

use std::sync::Arc;

use storefront_app::{context::AppContext, domain::checkout::CheckoutWorkflow};

/// Shared by every handler through the depot.
#[derive(Debug, Clone)]
pub(crate) struct State {
    pub(crate) checkout: Arc<CheckoutWorkflow>,
}

impl State {
    #[must_use]
    pub(crate) fn from_app_context(app: AppContext) -> Arc<Self> {
        Arc::new(Self {
            checkout: app.checkout,
        })
    }
}
