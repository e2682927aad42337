//! Continuation store errors.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContinuationStoreError {
    #[error("continuation storage error")]
    Io(#[from] io::Error),

    #[error("continuation could not be serialized")]
    Serialization(#[from] serde_json::Error),
}
