//! Error types for calls to the external store

use thiserror::Error;

/// Result type alias for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors returned by a [`Backend`](crate::Backend).
///
/// The dashboard does not branch on the variant: every failure is shown as
/// its message. For [`BackendError::Api`] that message is the provider's own
/// text, unchanged.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The external service answered with an error
    #[error("{message}")]
    Api {
        /// HTTP status code of the response
        status: u16,
        /// Message reported by the service
        message: String,
    },

    /// The request never produced a response
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be decoded
    #[error("Invalid response from backend: {0}")]
    Json(#[from] serde_json::Error),

    /// The client could not be built from its configuration
    #[error("Invalid backend configuration: {message}")]
    Configuration {
        /// Error message
        message: String,
    },
}

impl BackendError {
    /// Create an API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_api_error_displays_provider_message_verbatim() {
        let error = BackendError::api(400, "Invalid login credentials");
        assert_eq!(error.to_string(), "Invalid login credentials");
    }

    #[test]
    fn test_configuration_error_display() {
        let error = BackendError::configuration("relative URL without a base");
        assert_eq!(
            error.to_string(),
            "Invalid backend configuration: relative URL without a base"
        );
    }
}
