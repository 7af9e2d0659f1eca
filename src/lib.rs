//! Document Archive Rust Client
//!
//! A Rust client library for the office document archive API, with bearer
//! authentication, session persistence, and transparent token refresh.

pub mod api;
pub mod auth_client;
pub mod error;
pub mod request;
pub mod retry;
pub mod token_store;
pub mod types;

pub use auth_client::{ApiClient, ApiClientConfig};
pub use error::{ApiError, ClientError, RefreshError, Result};
pub use request::{ApiRequest, FileUpload, FormData, RequestBody};
pub use token_store::{FileSessionStore, SessionStore, TokenStore};
pub use types::{ExpiryReason, LoginResponse, Session, SessionEvent};
