//! Client error types.

use crate::config::ConfigError;

/// Errors that can occur when talking to a Koku server.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a 4xx or 5xx status.
    #[error("{method} {path} returned {status}: {message}")]
    Api {
        /// Request method.
        method: String,
        /// Request path, including the query string.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Pretty-printed JSON error body, or the raw text if it was not JSON.
        message: String,
    },

    /// Login succeeded but the response carried no token.
    #[error("login response did not contain a token")]
    MissingToken,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid programmatic configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// HTTP status of an API error, if the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether this is an API error in the 4xx range.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = ClientError::Api {
            method: "DELETE".into(),
            path: "/api/v1/customers/x/".into(),
            status: 404,
            message: "{\"detail\": \"Not found.\"}".into(),
        };

        assert_eq!(err.status(), Some(404));
        assert!(err.is_client_error());
        assert_eq!(
            err.to_string(),
            "DELETE /api/v1/customers/x/ returned 404: {\"detail\": \"Not found.\"}"
        );
    }

    #[test]
    fn non_api_errors_have_no_status() {
        assert_eq!(ClientError::MissingToken.status(), None);
        assert!(!ClientError::Configuration("x".into()).is_client_error());
    }
}
