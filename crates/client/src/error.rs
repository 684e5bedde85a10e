//! Client-wide error taxonomy.
//!
//! Every backend call resolves to one `ApiError` variant. Callers handle
//! errors at the boundary that issued the call; nothing propagates further
//! up as a panic.

use thiserror::Error;

/// Errors produced by the Souk API clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Login was rejected by the auth service (HTTP 401 on `/login`).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A protected request could not be authenticated, including after the
    /// refresh protocol ran its course. The session has been cleared.
    #[error("authentication required")]
    Unauthorized,

    /// The authenticated user lacks the role for this operation (HTTP 403).
    #[error("access denied")]
    Forbidden,

    /// The requested resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Client-side validation failed; the request never reached the network.
    #[error("{0}")]
    Validation(String),

    /// The backend rejected the request on business grounds (4xx). Carries
    /// the backend's own message where one was provided.
    #[error("{0}")]
    Rejected(String),

    /// The server could not be reached (connect failure or timeout).
    #[error("cannot reach server")]
    Unreachable,

    /// The response body did not match the expected contract.
    #[error("unexpected response shape: {0}")]
    UnexpectedPayload(String),

    /// The backend failed with a 5xx status.
    #[error("server error (status {status})")]
    Server {
        /// HTTP status code returned by the backend.
        status: u16,
    },
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            Self::Unreachable
        } else if err.is_decode() {
            Self::UnexpectedPayload(err.to_string())
        } else {
            match err.status() {
                Some(status) if status.is_server_error() => Self::Server {
                    status: status.as_u16(),
                },
                _ => Self::Unreachable,
            }
        }
    }
}

/// Error body shape used by the platform services.
///
/// Services are inconsistent about the field name, so both are accepted.
#[derive(Debug, serde::Deserialize, Default)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// The backend's message, or a generic fallback.
    pub fn message_or(self, fallback: &str) -> String {
        self.message
            .or(self.error)
            .unwrap_or_else(|| fallback.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_prefers_message() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"message":"promo code expired","error":"bad"}"#).unwrap();
        assert_eq!(body.message_or("fallback"), "promo code expired");
    }

    #[test]
    fn test_error_body_falls_back_to_error_field() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"invalid promo"}"#).unwrap();
        assert_eq!(body.message_or("fallback"), "invalid promo");
    }

    #[test]
    fn test_error_body_generic_fallback() {
        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.message_or("something went wrong"), "something went wrong");
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(ApiError::InvalidCredentials.to_string(), "invalid credentials");
        assert_eq!(ApiError::Unreachable.to_string(), "cannot reach server");
        assert_eq!(
            ApiError::Server { status: 502 }.to_string(),
            "server error (status 502)"
        );
    }
}
