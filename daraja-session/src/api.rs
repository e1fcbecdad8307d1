//! Remote authentication API
//!
//! The backend contract is external; this module only needs to know whether
//! a call succeeded and which token/user it handed back.

use crate::user::UserProfile;
use crate::{SessionError, SessionResult};
use async_trait::async_trait;
use daraja_core::{ApiConfig, DarajaError, ErrorContext};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Successful login payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "access_token")]
    pub token: String,
    pub user: UserProfile,
}

/// Result of re-validating a token with the backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentSession {
    pub user: UserProfile,
}

// `/auth/me` answers with either `{"user": {...}}` or the bare profile
impl<'de> Deserialize<'de> for CurrentSession {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Body {
            Wrapped { user: UserProfile },
            Bare(UserProfile),
        }

        Ok(match Body::deserialize(deserializer)? {
            Body::Wrapped { user } | Body::Bare(user) => CurrentSession { user },
        })
    }
}

/// Authentication backend
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a token; bad credentials are `InvalidCredentials`
    async fn login(&self, email: &str, password: &str) -> SessionResult<LoginResponse>;

    /// Revoke the token server-side
    async fn logout(&self, token: &str) -> SessionResult<()>;

    /// Fetch the user behind a token; a rejected token is `ExpiredToken`
    async fn current_session(&self, token: &str) -> SessionResult<CurrentSession>;
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// REST/JSON implementation of [`AuthApi`]
pub struct HttpAuthApi {
    client: reqwest::Client,
    config: ApiConfig,
}

impl HttpAuthApi {
    pub fn new(config: ApiConfig) -> SessionResult<Self> {
        let client = create_http_client(&config)?;

        info!("Created auth API client for {}", config.base_url);

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, email: &str, password: &str) -> SessionResult<LoginResponse> {
        let url = self.config.endpoint(&self.config.login_path);
        debug!(url = %url, "Sending login request");

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => response
                .json::<LoginResponse>()
                .await
                .map_err(|e| SessionError::malformed(format!("login response: {}", e))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(SessionError::InvalidCredentials)
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let body = response.text().await.unwrap_or_default();
                Err(SessionError::validation(error_message(&body, "login rejected")))
            }
            _ => Err(handle_response_error(response, "login").await),
        }
    }

    async fn logout(&self, token: &str) -> SessionResult<()> {
        let url = self.config.endpoint(&self.config.logout_path);

        let response = self.client.post(&url).bearer_auth(token).send().await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SessionError::ExpiredToken),
            _ => Err(handle_response_error(response, "logout").await),
        }
    }

    async fn current_session(&self, token: &str) -> SessionResult<CurrentSession> {
        let url = self.config.endpoint(&self.config.session_path);

        let response = self.client.get(&url).bearer_auth(token).send().await?;

        match response.status() {
            status if status.is_success() => response
                .json::<CurrentSession>()
                .await
                .map_err(|e| SessionError::malformed(format!("session response: {}", e))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SessionError::ExpiredToken),
            _ => Err(handle_response_error(response, "current_session").await),
        }
    }
}

/// Build an HTTP client with the configured timeout and user agent
pub(crate) fn create_http_client(config: &ApiConfig) -> SessionResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| {
            SessionError::Core(DarajaError::Config {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            })
        })
}

/// Turn an unexpected HTTP status into a network error
pub(crate) async fn handle_response_error(
    response: reqwest::Response,
    operation: &str,
) -> SessionError {
    let status = response.status();
    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();

    warn!(
        operation = operation,
        status = status.as_u16(),
        url = %url,
        "Unexpected response from backend"
    );

    SessionError::network(format!(
        "HTTP {} from {}: {}",
        status.as_u16(),
        url,
        error_message(&body, status.canonical_reason().unwrap_or("Unknown error"))
    ))
}

/// Pull a human-readable message out of an error body
fn error_message(body: &str, fallback: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }
    if body.trim().is_empty() {
        fallback.to_string()
    } else {
        body.trim().to_string()
    }
}
