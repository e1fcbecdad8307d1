//! Authorized HTTP client for backend calls
//!
//! Attaches the current bearer token to every request and ends the session
//! when the backend answers 401.

use crate::api::{create_http_client, handle_response_error};
use crate::manager::SessionManager;
use crate::state::LogoutReason;
use crate::{SessionError, SessionResult};
use daraja_core::ApiConfig;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Thin JSON client bound to a [`SessionManager`]
pub struct AuthorizedClient {
    client: reqwest::Client,
    config: ApiConfig,
    session: Arc<SessionManager>,
}

impl AuthorizedClient {
    pub fn new(config: ApiConfig, session: Arc<SessionManager>) -> SessionResult<Self> {
        let client = create_http_client(&config)?;
        Ok(Self {
            client,
            config,
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Request builder for `path`, without credentials
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.config.endpoint(path))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> SessionResult<T> {
        self.send_json(self.request(Method::GET, path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> SessionResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> SessionResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> SessionResult<()> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> SessionResult<T> {
        let response = self.send(request).await?;
        let url = response.url().clone();
        response
            .json::<T>()
            .await
            .map_err(|e| SessionError::malformed(format!("response from {}: {}", url, e)))
    }

    /// Send with the bearer token attached; non-success statuses become errors
    async fn send(&self, request: RequestBuilder) -> SessionResult<reqwest::Response> {
        let token = self.session.get_token().await;
        let request = match &token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "Backend response");

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            return match token {
                Some(token) => {
                    info!("Backend rejected the session token");
                    self.session
                        .expire_token(&token, LogoutReason::Unauthorized)
                        .await;
                    Err(SessionError::ExpiredToken)
                }
                None => Err(SessionError::NoActiveSession),
            };
        }

        Err(handle_response_error(response, "authorized_request").await)
    }
}
