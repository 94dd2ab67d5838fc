//! REST client for the backend.
//!
//! [`ApiClient`] joins paths onto the configured base URL and attaches the
//! bearer token found in the injected [`SessionStorage`]. The rest of the
//! application depends only on the [`Backend`] trait.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::models::{
    CommunicationRequest, Decision, House, LoginRequest, LoginResponse, NewCommunicationRequest,
    Provider, ValidateRequest,
};
use crate::storage::{SessionStorage, ACCESS_TOKEN_KEY};

/// Errors returned by backend calls.
///
/// `Clone` so it can sit in a controller's `error` slot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("not signed in")]
    MissingSession,
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// Backend operations used by the application.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Exchanges credentials for a token.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError>;

    /// Resolves a provider from its access code.
    async fn validate_provider(&self, code: &str) -> Result<Provider, ApiError>;

    /// Lists the houses a provider serves.
    async fn houses_for_provider(&self, provider_id: &str) -> Result<Vec<House>, ApiError>;

    /// Lists the communication requests addressed to a house.
    async fn communication_requests(
        &self,
        house_id: &str,
    ) -> Result<Vec<CommunicationRequest>, ApiError>;

    /// Creates a communication request on behalf of a visitor.
    async fn create_communication_request(
        &self,
        request: &NewCommunicationRequest,
    ) -> Result<(), ApiError>;

    /// Accepts or rejects a pending request.
    async fn validate_communication_request(
        &self,
        id: &str,
        decision: Decision,
    ) -> Result<(), ApiError>;
}

/// HTTP implementation of [`Backend`].
pub struct ApiClient {
    http: Client,
    base_url: String,
    storage: Arc<dyn SessionStorage>,
}

impl ApiClient {
    /// Creates a client for `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig, storage: Arc<dyn SessionStorage>) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            storage,
        })
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Builds a request, with a bearer token when the session holds one.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, self.url(path));
        match self.storage.get(ACCESS_TOKEN_KEY) {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch<R: DeserializeOwned>(request: RequestBuilder) -> Result<R, ApiError> {
        let response = Self::checked(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn submit(request: RequestBuilder) -> Result<(), ApiError> {
        Self::checked(request.send().await?).await?;
        Ok(())
    }

    async fn checked(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest { email, password };
        Self::fetch(self.request(Method::POST, "/auth/login").json(&body)).await
    }

    async fn validate_provider(&self, code: &str) -> Result<Provider, ApiError> {
        Self::fetch(self.request(Method::GET, &format!("/providers/validate/{code}"))).await
    }

    async fn houses_for_provider(&self, provider_id: &str) -> Result<Vec<House>, ApiError> {
        Self::fetch(self.request(Method::GET, &format!("/houses/provider/{provider_id}"))).await
    }

    async fn communication_requests(
        &self,
        house_id: &str,
    ) -> Result<Vec<CommunicationRequest>, ApiError> {
        Self::fetch(self.request(Method::GET, &format!("/communication-requests/{house_id}")))
            .await
    }

    async fn create_communication_request(
        &self,
        request: &NewCommunicationRequest,
    ) -> Result<(), ApiError> {
        Self::submit(self.request(Method::POST, "/communication-requests").json(request)).await
    }

    async fn validate_communication_request(
        &self,
        id: &str,
        decision: Decision,
    ) -> Result<(), ApiError> {
        let body = ValidateRequest { status: decision };
        Self::submit(
            self.request(Method::POST, &format!("/communication-requests/{id}/validate"))
                .json(&body),
        )
        .await
    }
}
