//! Mapping unexpected failures to HTTP errors.

use std::fmt::Display;

use salvo::prelude::StatusError;
use tracing::error;

pub(crate) trait ResultExt<T> {
    /// Log the error under `context` and answer 500. Details never reach the client.
    fn or_500(self, context: &str) -> Result<T, StatusError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Display,
{
    fn or_500(self, context: &str) -> Result<T, StatusError> {
        self.map_err(|source| {
            error!(error = %source, "{context}");

            StatusError::internal_server_error().brief(context.to_owned())
        })
    }
}

#[cfg(test)]
mod tests {
    use salvo::http::StatusCode;

    use super::*;

    #[test]
    fn error_becomes_500_without_details() {
        let failed: Result<(), &str> = Err("disk full at /var/continuations");

        let error = failed.or_500("failed to abandon checkout").err();

        assert_eq!(error.as_ref().map(|e| e.code), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(
            error.map(|e| e.brief),
            Some("failed to abandon checkout".to_owned())
        );
    }
}
