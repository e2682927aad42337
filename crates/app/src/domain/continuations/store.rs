//! Continuation store.

use async_trait::async_trait;
use mockall::automock;

use crate::domain::{
    checkout::CheckoutKey,
    continuations::{errors::ContinuationStoreError, models::CheckoutContinuation},
};

#[automock]
#[async_trait]
pub trait ContinuationStore: Send + Sync {
    /// Durably persist `continuation`, replacing any earlier one for the same key. Must have
    /// completed before the customer can be redirected.
    async fn save(
        &self,
        continuation: &CheckoutContinuation,
    ) -> Result<(), ContinuationStoreError>;

    /// The continuation for `key`, if one exists and has not expired.
    async fn load(
        &self,
        key: &CheckoutKey,
    ) -> Result<Option<CheckoutContinuation>, ContinuationStoreError>;

    /// Remove the continuation for `key`. Removing a missing continuation is not an error.
    async fn clear(&self, key: &CheckoutKey) -> Result<(), ContinuationStoreError>;
}
