//! Shared request/validate helper for the resource clients
//!
//! Every resource call goes through [`ApiClient::call`]:
//!
//! 1. ask the token provider for a fresh access token (refreshing if due)
//! 2. read the current client id
//! 3. POST `{base}/{client_id}/{resource}/{action}` with a JSON body
//! 4. reject anything but 200 with [`ApiError::Api`]
//! 5. decode the body, an empty body being `null`

use std::sync::Arc;
use std::time::Duration;

use mdrkit_domain::{ApiSettings, MdrError};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::auth::AccessTokenProvider;
use super::errors::ApiError;
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Which token goes into the `Authorization` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bearer {
    /// The session access token
    Session,
    /// The identity provider token, for calls that need elevated rights
    Identity,
}

/// Configuration for API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for resource paths (e.g., "https://mdr.example.com/api/v1")
    pub base_url: String,
    /// Upper bound for one call, transport retries included
    pub timeout: Duration,
}

impl ApiClientConfig {
    /// Base URL and a timeout that covers every transport attempt
    pub fn from_settings(settings: &ApiSettings) -> Self {
        Self {
            base_url: settings.base_url(),
            timeout: Duration::from_secs(
                settings.timeout_seconds.saturating_mul(settings.transport_attempts.max(1) as u64),
            ),
        }
    }
}

/// Request helper shared by every resource client
pub struct ApiClient {
    http: Arc<HttpClient>,
    auth: Arc<dyn AccessTokenProvider>,
    config: ApiClientConfig,
}

impl ApiClient {
    /// Client on top of `http`, taking tokens and the client id from `auth`
    pub fn new(
        config: ApiClientConfig,
        http: Arc<HttpClient>,
        auth: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        Self { http, auth, config }
    }

    /// Base URL and timeout in use
    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Token provider this client reads tokens and the client id from
    pub fn auth(&self) -> &Arc<dyn AccessTokenProvider> {
        &self.auth
    }

    /// POST `body` to `{base}/{client_id}/{resource}/{action}`.
    ///
    /// `failure` is a short human description logged when the call fails.
    ///
    /// # Errors
    /// - whatever the token provider returns while refreshing
    /// - `ApiError::Api` for any status other than 200
    /// - `ApiError::Network`/`ApiError::Timeout` for transport failures
    /// - `ApiError::Client` if a 200 body is not JSON
    #[instrument(skip(self, body), fields(resource = %resource, action = %action))]
    pub async fn call<B>(
        &self,
        resource: &str,
        action: &str,
        body: &B,
        bearer: Bearer,
        failure: &str,
    ) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        // Runs for identity-token calls too so the session never goes stale
        let session_token = self.auth.access_token().await?;
        let token = match bearer {
            Bearer::Session => session_token,
            Bearer::Identity => self.auth.identity_token().await?,
        };
        let client_id = self.auth.client_id().await?;

        let url = format!("{}/{}/{}/{}", self.config.base_url, client_id, resource, action);
        debug!(url = %url, ?bearer, "POST request");

        let request =
            self.http.request(Method::POST, &url).bearer_auth(token.value()).json(body);
        let (status, text) = dispatch(&self.http, request, self.config.timeout).await?;

        if status != StatusCode::OK {
            warn!(status = status.as_u16(), body = %text, "{failure}");
            return Err(ApiError::Api {
                action: format!("{resource}/{action}"),
                status: status.as_u16(),
                body: text,
            });
        }

        parse_body(&text)
    }
}

/// Send `request` bounded by `timeout` and read the whole body.
pub(crate) async fn dispatch(
    http: &HttpClient,
    request: RequestBuilder,
    timeout: Duration,
) -> Result<(StatusCode, String), ApiError> {
    let response = match tokio::time::timeout(timeout, http.send(request)).await {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => return Err(err.into()),
        Err(_) => return Err(ApiError::Timeout(timeout)),
    };

    let status = response.status();
    let text = response.text().await.map_err(|err| MdrError::from(InfraError::from(err)))?;
    Ok((status, text))
}

/// Decode a response body, treating an empty one as `null`.
pub(crate) fn parse_body(text: &str) -> Result<Value, ApiError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text)
        .map_err(|err| ApiError::Client(format!("Failed to parse response: {err}")))
}
