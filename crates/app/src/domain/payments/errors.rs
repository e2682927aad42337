//! Payment errors.

use thiserror::Error;

/// Errors returned by a payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The gateway could not be reached or reported a server-side failure.
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),

    /// The gateway did not answer in time. The outcome of the request is unknown.
    #[error("payment gateway timed out")]
    Timeout,

    /// The payment was refused.
    #[error("payment declined: {message}")]
    Declined { message: String },

    /// The gateway answered with something that could not be understood.
    #[error("unexpected response from payment gateway: {0}")]
    UnexpectedResponse(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_decode() {
            Self::UnexpectedResponse(error.to_string())
        } else {
            Self::Unavailable(error.to_string())
        }
    }
}

/// Errors checking a client secret against the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no payment session is open for this checkout")]
    Missing,

    #[error("payment session has been replaced")]
    Stale,
}
