//! OAuth2 refresh-token exchange.
//!
//! Access tokens expire; a long-lived refresh token plus the app's client
//! credentials buy a new one. The result is meant for
//! [`AdsApi::set_access_token`](crate::AdsApi::set_access_token).

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{parse_json, take_key};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.snapchat.com/login/oauth2/access_token";

/// App credentials and the refresh token to exchange.
#[derive(Clone)]
pub struct RefreshCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub token_url: String,
}

impl std::fmt::Debug for RefreshCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_url", &self.token_url)
            .finish()
    }
}

impl RefreshCredentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }
}

pub fn build_refresh_request(credentials: &RefreshCredentials) -> HttpRequest {
    HttpRequest::new(HttpMethod::Post, credentials.token_url.as_str()).with_form_body([
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.as_str()),
        ("grant_type", "refresh_token"),
        ("refresh_token", credentials.refresh_token.as_str()),
    ])
}

/// Extract `access_token` from the token endpoint's reply.
pub fn parse_refresh_response(response: HttpResponse) -> Result<String, ApiError> {
    match take_key(parse_json(response)?, "access_token")? {
        Value::String(token) if !token.is_empty() => Ok(token),
        other => Err(ApiError::MalformedResponse(format!(
            "`access_token` should be a non-empty string, got {other}"
        ))),
    }
}

/// Exchange the refresh token for a fresh access token.
pub fn refresh_access_token<T: Transport>(
    transport: &T,
    credentials: &RefreshCredentials,
) -> Result<String, ApiError> {
    debug!(client_id = %credentials.client_id, url = %credentials.token_url, "refreshing access token");
    let response = transport.send(&build_refresh_request(credentials))?;
    parse_refresh_response(response).inspect_err(|e| {
        warn!(client_id = %credentials.client_id, error = %e, "access token refresh failed");
    })
}
