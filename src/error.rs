//! Error types for the document archive client

use reqwest::StatusCode;
use thiserror::Error;

/// Client error types
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("Token refresh failed: {0}")]
    Refresh(#[from] RefreshError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// HTTP status carried by the error, if the server produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(e) => Some(e.status),
            Self::Refresh(RefreshError::Rejected { status, .. }) => Some(*status),
            Self::HttpRequest(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true for an expired-session (401) response
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }

    /// Message suitable for showing to a user.
    ///
    /// Prefers the human-readable message the backend put in its payload and falls back to
    /// the error's own description.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.message.clone(),
            Self::Refresh(RefreshError::Rejected { message, .. }) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Non-success response returned by the backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Server error {status}: {message}")]
pub struct ApiError {
    pub status: u16,
    /// Normalized human-readable message
    pub message: String,
    /// Raw response body
    pub body: String,
}

impl ApiError {
    /// Build an error from a status code and raw body.
    ///
    /// The backend is not consistent about where it puts the message, so `message` is
    /// tried first, then `error`, then the canonical reason of the status code.
    pub fn from_body(status: StatusCode, body: String) -> Self {
        let message = extract_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string())
        });

        Self {
            status: status.as_u16(),
            message,
            body,
        }
    }

    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self::from_body(status, body)
    }
}

fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .filter_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Outcome of a failed refresh exchange.
///
/// Cloned to every request waiting on the same exchange.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("No refresh token available")]
    MissingRefreshToken,

    #[error("refresh endpoint returned {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("refresh outcome was not delivered")]
    Abandoned,
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_field_preferred() {
        let err = ApiError::from_body(
            StatusCode::BAD_REQUEST,
            r#"{"message":"username already taken","error":"conflict"}"#.to_string(),
        );
        assert_eq!(err.status, 400);
        assert_eq!(err.message, "username already taken");
    }

    #[test]
    fn test_error_field_fallback() {
        let err = ApiError::from_body(
            StatusCode::NOT_FOUND,
            r#"{"message":"","error":"document not found"}"#.to_string(),
        );
        assert_eq!(err.message, "document not found");
    }

    #[test]
    fn test_non_json_body_uses_status_reason() {
        let err = ApiError::from_body(StatusCode::BAD_GATEWAY, "<html>oops</html>".to_string());
        assert_eq!(err.message, "Bad Gateway");
        assert_eq!(err.body, "<html>oops</html>");
    }

    #[test]
    fn test_user_message() {
        let err = ClientError::Api(ApiError::from_body(
            StatusCode::UNAUTHORIZED,
            r#"{"message":"invalid credentials"}"#.to_string(),
        ));
        assert!(err.is_unauthorized());
        assert_eq!(err.user_message(), "invalid credentials");

        let err = ClientError::Refresh(RefreshError::MissingRefreshToken);
        assert_eq!(err.status(), None);
        assert_eq!(
            err.user_message(),
            "Token refresh failed: No refresh token available"
        );
    }
}
