//! Authentication endpoints

use crate::ClientError;
use crate::auth_client::ApiClient;
use crate::error::Result;
use crate::request::{ApiRequest, FormData};
use crate::types::LoginResponse;
use tracing::{info, warn};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const LOGOUT_PATH: &str = "/api/auth/logout";

impl ApiClient {
    /// Sign in with username and password
    ///
    /// The returned token pair is persisted and becomes the current session.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let request = ApiRequest::post(LOGIN_PATH)
            .form(
                FormData::new()
                    .text("username", username)
                    .text("password", password),
            )
            .skip_refresh();
        let tokens: LoginResponse = self.execute(request).await?;

        let session = tokens.clone().into_session().ok_or_else(|| {
            ClientError::InvalidResponse("login response is missing tokens".to_string())
        })?;
        self.start_session(&session)?;
        info!(username = %username, "Signed in");

        Ok(tokens)
    }

    /// Sign out, revoking the refresh token on the backend
    ///
    /// The local session is cleared even when the backend call fails.
    pub async fn logout(&self) -> Result<()> {
        let refresh_token = self
            .session()?
            .and_then(|s| s.refresh_token().map(str::to_string));

        if let Some(refresh_token) = refresh_token {
            let request = ApiRequest::post(LOGOUT_PATH)
                .form(FormData::new().text("refresh_token", refresh_token))
                .skip_refresh();
            if let Err(e) = self.execute::<serde_json::Value>(request).await {
                warn!(error = %e, "Logout request failed, clearing local session anyway");
            }
        }

        self.end_session();
        info!("Signed out");
        Ok(())
    }
}
