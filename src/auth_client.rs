//! Authenticated API client with single-flight token refresh

use crate::error::{ApiError, ClientError, RefreshError, Result};
use crate::request::{ApiRequest, FormData, RequestBody};
use crate::retry::RetryCounter;
use crate::token_store::SessionStore;
use crate::types::*;
use async_singleflight::Group;
use reqwest::{Client, ClientBuilder, Method, StatusCode, Url, header};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Default backend location
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Environment variable overriding the backend location
pub const BASE_URL_ENV: &str = "ARCHIVE_API_URL";

/// Single-flight key shared by every refresh, there is only one session to renew
const REFRESH_KEY: &str = "session";

const EVENT_CAPACITY: usize = 16;

/// Macro to turn a non-success refresh response into a `RefreshError`
macro_rules! check_refresh_response {
    ($response:expr) => {
        if !$response.status().is_success() {
            let error = ApiError::from_response($response).await;
            return Err(RefreshError::Rejected {
                status: error.status,
                message: error.message,
            });
        }
    };
}

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Backend base URL, without trailing slash
    /// Default: http://localhost:8080
    pub base_url: String,

    /// Path of the token-refresh endpoint
    /// Default: /api/auth/refresh
    pub refresh_path: String,

    /// Login entry point the application should navigate to when the session is lost
    /// Default: /login
    pub login_path: String,

    /// Refresh-triggered retry cycles allowed per endpoint before forcing logout
    /// Default: 2
    pub max_retry_per_endpoint: u32,

    /// Timeout for regular requests in seconds
    /// Default: 30 seconds
    pub request_timeout_secs: u64,

    /// Timeout for the refresh exchange in seconds
    /// Default: 10 seconds
    pub refresh_timeout_secs: u64,
}

impl ApiClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Configuration with the base URL taken from `ARCHIVE_API_URL`
    pub fn from_env() -> Self {
        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn with_max_retry_per_endpoint(mut self, max: u32) -> Self {
        self.max_retry_per_endpoint = max;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ClientError::Configuration("base_url is required".into()));
        }
        if self.max_retry_per_endpoint == 0 {
            return Err(ClientError::Configuration(
                "max_retry_per_endpoint must be at least 1".into(),
            ));
        }
        Url::parse(&self.base_url).map_err(|e| {
            ClientError::Configuration(format!("invalid base_url {}: {e}", self.base_url))
        })?;
        Ok(())
    }
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_path: "/api/auth/refresh".to_string(),
            login_path: "/login".to_string(),
            max_retry_per_endpoint: 2,
            request_timeout_secs: 30,
            refresh_timeout_secs: 10,
        }
    }
}

/// Authenticated client for the archive API
///
/// Attaches the stored access token to every request. When a request comes back
/// unauthorized, the client exchanges the refresh token for a new pair and replays the
/// request. Requests that hit an expired session while an exchange is already running
/// wait for that exchange instead of starting their own.
pub struct ApiClient {
    config: ApiClientConfig,
    base_url: String,
    http_client: Client,
    session_store: Box<dyn SessionStore>,
    retry_counter: RetryCounter,
    /// Singleflight group so that at most one refresh runs at a time
    refresh_group: Group<String, RefreshError>,
    /// Bumped whenever the session is dropped
    session_epoch: AtomicU64,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    /// * `config` - Client configuration
    /// * `session_store` - Where the session is read from and persisted to
    pub fn new(config: ApiClientConfig, session_store: impl SessionStore) -> Result<Arc<Self>> {
        config.validate()?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        let http_client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("docarchive-rs-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Arc::new(Self {
            retry_counter: RetryCounter::new(config.max_retry_per_endpoint),
            config,
            base_url,
            http_client,
            session_store: Box::new(session_store),
            refresh_group: Group::new(),
            session_epoch: AtomicU64::new(0),
            events,
        }))
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Subscribe to session lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Current session, if any
    pub fn session(&self) -> Result<Option<Session>> {
        self.session_store.load()
    }

    /// Install a session obtained elsewhere
    pub fn set_session(&self, session: &Session) -> Result<()> {
        self.session_store.save(session)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.session_store.load(), Ok(Some(_)))
    }

    /// Refresh-triggered retries currently recorded for an endpoint
    pub fn retry_count(&self, endpoint: &str) -> u32 {
        self.retry_counter.get(endpoint)
    }

    /// Forget every recorded refresh-triggered retry
    pub fn reset_retry_counts(&self) {
        self.retry_counter.reset();
    }

    /// Issue a request and decode the JSON response body
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<T> {
        let request = ApiRequest::new(method, path).body(body.unwrap_or_default());
        self.execute(request).await
    }

    /// Execute a request description and decode the JSON response body
    ///
    /// An empty response body decodes as JSON `null`.
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let text = self.execute_text(&request).await?;
        let text = if text.trim().is_empty() { "null" } else { &text };
        Ok(serde_json::from_str(text)?)
    }

    /// Execute a request and return the raw response body
    pub async fn execute_text(&self, request: &ApiRequest) -> Result<String> {
        let url = self.url_for(request)?;
        let endpoint = endpoint_key(&url);
        let mut retried = false;

        loop {
            let epoch = self.session_epoch.load(Ordering::Acquire);
            let session = self.session_store.load()?;
            let response = self
                .send(request, url.clone(), session.as_ref().map(|s| s.access_token.as_str()))
                .await?;
            let status = response.status();

            if status.is_success() {
                self.retry_counter.clear(&endpoint);
                return Ok(response.text().await?);
            }

            let error = ApiError::from_response(response).await;
            debug!(
                endpoint = %endpoint,
                status = %status,
                error = %error.message,
                "Request failed"
            );

            if status != StatusCode::UNAUTHORIZED || request.skip_refresh {
                return Err(error.into());
            }

            // The session this request was sent with has already been dropped
            if self.session_epoch.load(Ordering::Acquire) != epoch {
                debug!(endpoint = %endpoint, "Session ended while request was in flight");
                return Err(error.into());
            }

            if retried {
                warn!(endpoint = %endpoint, "Request still unauthorized after token refresh");
                self.expire_session(ExpiryReason::RetriedRequestRejected { endpoint });
                return Err(error.into());
            }

            if !self.retry_counter.allows(&endpoint) {
                warn!(
                    endpoint = %endpoint,
                    max_retry = %self.retry_counter.ceiling(),
                    "Max retry attempts reached"
                );
                self.expire_session(ExpiryReason::RetryLimitReached { endpoint });
                return Err(error.into());
            }

            self.refresh_singleflight(&endpoint).await?;
            retried = true;
        }
    }

    /// Explicitly renew the session tokens, returning the new access token
    ///
    /// Shares the exchange with any refresh already running.
    pub async fn refresh_tokens(&self) -> Result<String> {
        self.refresh_singleflight(&self.config.refresh_path).await
    }

    async fn send(
        &self,
        request: &ApiRequest,
        url: Url,
        access_token: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut builder = self.http_client.request(request.method.clone(), url);

        if let Some(token) = access_token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(form) => builder.multipart(form.to_multipart()?),
        };

        Ok(builder.send().await?)
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url> {
        let raw = format!("{}{}", self.base_url, request.path);
        let parsed = if request.query.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, &request.query)
        };
        parsed.map_err(|e| ClientError::Configuration(format!("invalid request URL {raw}: {e}")))
    }

    async fn refresh_singleflight(&self, endpoint: &str) -> Result<String> {
        // Only the caller that starts the exchange runs this future; everyone arriving
        // while it is in flight waits for its outcome
        let refresh_key = REFRESH_KEY.to_string();
        let (success_opt, error_opt, _shared) = self
            .refresh_group
            .work(&refresh_key, async {
                let attempt = self.retry_counter.increment(endpoint);
                debug!(endpoint = %endpoint, attempt = %attempt, "Refreshing session tokens");

                match self.do_refresh().await {
                    Ok(session) => {
                        self.retry_counter.clear(endpoint);
                        info!(endpoint = %endpoint, "Token refresh successful");
                        let _ = self.events.send(SessionEvent::Refreshed);
                        Ok(session.access_token)
                    }
                    Err(e) => {
                        warn!(endpoint = %endpoint, error = %e, "Token refresh failed");
                        let reason = match &e {
                            RefreshError::MissingRefreshToken => ExpiryReason::MissingRefreshToken,
                            other => ExpiryReason::RefreshFailed {
                                message: other.to_string(),
                            },
                        };
                        self.expire_session(reason);
                        Err(e)
                    }
                }
            })
            .await;

        match (success_opt, error_opt) {
            (Some(token), None) => Ok(token),
            (_, Some(e)) => Err(e.into()),
            (None, None) => Err(RefreshError::Abandoned.into()),
        }
    }

    /// Exchange the stored refresh token for a new token pair and persist it
    async fn do_refresh(&self) -> std::result::Result<Session, RefreshError> {
        let refresh_token = self
            .session_store
            .load()
            .map_err(|e| RefreshError::Transport(e.to_string()))?
            .and_then(|s| s.refresh_token().map(str::to_string))
            .ok_or(RefreshError::MissingRefreshToken)?;

        let url = format!("{}{}", self.base_url, self.config.refresh_path);
        let form = FormData::new()
            .text("refresh_token", refresh_token)
            .to_multipart()
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .timeout(Duration::from_secs(self.config.refresh_timeout_secs))
            .send()
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        check_refresh_response!(response);

        let tokens: LoginResponse = response
            .json()
            .await
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;
        let session = tokens.into_session().ok_or_else(|| {
            RefreshError::InvalidResponse("missing access_token or refresh_token".to_string())
        })?;

        self.session_store
            .save(&session)
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        Ok(session)
    }

    /// Persist a freshly issued session and announce it
    pub(crate) fn start_session(&self, session: &Session) -> Result<()> {
        self.session_store.save(session)?;
        let _ = self.events.send(SessionEvent::SignedIn);
        Ok(())
    }

    /// Drop the session at the user's request
    pub(crate) fn end_session(&self) {
        self.session_epoch.fetch_add(1, Ordering::AcqRel);
        if let Err(e) = self.session_store.clear() {
            warn!(error = %e, "Failed to clear session storage");
        }
        let _ = self.events.send(SessionEvent::SignedOut);
    }

    /// Drop a session that cannot be recovered and tell the application to go to login
    fn expire_session(&self, reason: ExpiryReason) {
        self.session_epoch.fetch_add(1, Ordering::AcqRel);
        if let Err(e) = self.session_store.clear() {
            warn!(error = %e, "Failed to clear session storage");
        }
        warn!(reason = %reason, redirect_to = %self.config.login_path, "Session expired, login required");
        let _ = self.events.send(SessionEvent::Expired {
            reason,
            redirect_to: self.config.login_path.clone(),
        });
    }
}

/// Relative request URL used to count retries
fn endpoint_key(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_store::TokenStore;

    #[test]
    fn test_config_defaults() {
        let config = ApiClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.refresh_path, "/api/auth/refresh");
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.max_retry_per_endpoint, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(matches!(
            ApiClientConfig::new("  ").validate(),
            Err(ClientError::Configuration(_))
        ));
        assert!(matches!(
            ApiClientConfig::new("not a url").validate(),
            Err(ClientError::Configuration(_))
        ));
        assert!(matches!(
            ApiClientConfig::default()
                .with_max_retry_per_endpoint(0)
                .validate(),
            Err(ClientError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_endpoint_key() {
        let client = ApiClient::new(
            ApiClientConfig::new("http://localhost:8080/"),
            TokenStore::new(),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");

        let url = client
            .url_for(&ApiRequest::get("/api/employee/").query([("page", "2"), ("name", "a b")]))
            .unwrap();
        assert_eq!(endpoint_key(&url), "/api/employee/?page=2&name=a+b");

        let url = client.url_for(&ApiRequest::get("/api/employee/me")).unwrap();
        assert_eq!(endpoint_key(&url), "/api/employee/me");
    }
}
