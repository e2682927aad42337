//! Products service errors.

use std::num::TryFromIntError;

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProductsServiceError {
    #[error("a product with this uuid already exists")]
    AlreadyExists,

    #[error("product not found")]
    NotFound,

    #[error("product name is required")]
    MissingName,

    /// Price or stock level below zero, rejected by the table's check constraints.
    #[error("price and stock must not be negative")]
    Negative,

    #[error("storage error")]
    Sql(#[source] Error),

    #[error("price or stock does not fit the stored range")]
    OutOfRange(#[from] TryFromIntError),
}

impl From<Error> for ProductsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::NotNullViolation) => Self::MissingName,
            Some(ErrorKind::CheckViolation) => Self::Negative,
            _ => Self::Sql(error),
        }
    }
}
