use std::fmt;
use std::time::Duration;

use mdrkit_common::resilience::policies::PredicateRetry;
use mdrkit_common::resilience::{RetryConfig, RetryExecutor};
use mdrkit_domain::{ApiSettings, MdrError};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use crate::errors::InfraError;

/// HTTP client with timeout and bounded retry on transport failures and 5xx.
///
/// Bearer tokens are attached per request by the callers.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    retry: RetryConfig,
    timeout: Duration,
}

/// Why a single attempt did not produce a final response
enum AttemptFailure {
    ServerError(Response),
    Transport(reqwest::Error),
    Request(MdrError),
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerError(response) => write!(f, "server responded {}", response.status()),
            Self::Transport(err) => write!(f, "{err}"),
            Self::Request(err) => write!(f, "{err}"),
        }
    }
}

impl AttemptFailure {
    fn is_retryable(&self) -> bool {
        match self {
            Self::ServerError(_) => true,
            Self::Transport(err) => should_retry_error(err),
            Self::Request(_) => false,
        }
    }

    /// The last 5xx response is handed back to the caller as-is so status
    /// handling stays in one place.
    fn into_result(self) -> Result<Response, MdrError> {
        match self {
            Self::ServerError(response) => Ok(response),
            Self::Transport(err) => Err(InfraError::from(err).into()),
            Self::Request(err) => Err(err),
        }
    }
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Client configured from the `[api]` settings section.
    ///
    /// # Errors
    /// Returns `MdrError::Network` if the TLS backend cannot be initialized.
    pub fn from_settings(settings: &ApiSettings) -> Result<Self, MdrError> {
        Self::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .max_attempts(settings.transport_attempts)
            .build()
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder with retry semantics.
    ///
    /// # Errors
    /// Returns `MdrError::Network` for transport failures that outlive the
    /// retry budget and `MdrError::Internal` for bodies that cannot be
    /// replayed.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, MdrError> {
        let executor = RetryExecutor::new(
            self.retry.clone(),
            PredicateRetry::new(|failure: &AttemptFailure, _attempt: u32| failure.is_retryable()),
        );

        let outcome = executor
            .execute(|| {
                let attempt = builder.try_clone();
                async move { self.attempt(attempt).await }
            })
            .await;

        outcome.or_else(|err| err.into_source().into_result())
    }

    async fn attempt(&self, builder: Option<RequestBuilder>) -> Result<Response, AttemptFailure> {
        let builder = builder.ok_or_else(|| {
            AttemptFailure::Request(MdrError::Internal(
                "request body cannot be cloned; buffer the body to enable retries".into(),
            ))
        })?;

        let request = builder
            .build()
            .map_err(|err| AttemptFailure::Request(InfraError::from(err).into()))?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                debug!(%method, %url, %status, "received HTTP response");
                if status.is_server_error() {
                    return Err(AttemptFailure::ServerError(response));
                }
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(AttemptFailure::Transport(err))
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(mdrkit_domain::constants::DEFAULT_TIMEOUT_SECONDS),
            max_attempts: mdrkit_domain::constants::DEFAULT_TRANSPORT_ATTEMPTS,
            base_backoff: Duration::from_millis(200),
            user_agent: None,
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    /// Timeout of a single attempt
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Delay before the first retry; each further retry waits one more step.
    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    /// `User-Agent` sent with every request
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Headers sent with every request
    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// # Errors
    /// Returns an error if the reqwest client cannot be constructed.
    pub fn build(self) -> Result<HttpClient, MdrError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| MdrError::from(InfraError::from(err)))?;

        let retry = RetryConfig::builder()
            .max_attempts(u32::try_from(self.max_attempts.max(1)).unwrap_or(u32::MAX))
            .linear_backoff(self.base_backoff, self.base_backoff)
            .build()
            .map_err(|err| MdrError::Config(err.to_string()))?;

        Ok(HttpClient { client, retry, timeout: self.timeout })
    }
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_request() || err.is_connect()
}
