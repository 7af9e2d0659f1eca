//! Type definitions for sessions and session lifecycle events

use serde::{Deserialize, Serialize};
use std::fmt;

/// Authentication tokens of the signed-in employee (access + refresh)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    /// May be missing when only the access token survived in storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl Session {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: Some(refresh_token.into()),
        }
    }

    /// Refresh token, treating an empty string as absent
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Token pair returned by the login and refresh endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

impl LoginResponse {
    /// Convert into a session, rejecting a response that lacks either token
    pub fn into_session(self) -> Option<Session> {
        if self.access_token.is_empty() || self.refresh_token.is_empty() {
            return None;
        }
        Some(Session::new(self.access_token, self.refresh_token))
    }
}

/// Why a session was terminated without the user asking for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpiryReason {
    /// The endpoint used up its refresh-triggered retries
    RetryLimitReached { endpoint: String },
    /// A request replayed after a refresh was still rejected
    RetriedRequestRejected { endpoint: String },
    /// No refresh token was stored when the access token expired
    MissingRefreshToken,
    /// The refresh endpoint rejected the exchange or could not be reached
    RefreshFailed { message: String },
}

impl fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetryLimitReached { endpoint } => {
                write!(f, "retry limit reached for {endpoint}")
            }
            Self::RetriedRequestRejected { endpoint } => {
                write!(f, "retried request to {endpoint} was rejected")
            }
            Self::MissingRefreshToken => f.write_str("no refresh token available"),
            Self::RefreshFailed { message } => write!(f, "token refresh failed: {message}"),
        }
    }
}

/// Session lifecycle notifications published by the client.
///
/// `Expired` is the signal for the consuming application to send the user back to the
/// login entry point named in `redirect_to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn,
    Refreshed,
    SignedOut,
    Expired {
        reason: ExpiryReason,
        redirect_to: String,
    },
}
