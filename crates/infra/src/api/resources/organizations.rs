use std::sync::Arc;
use std::time::Duration;

use mdrkit_common::resilience::policies::PredicateRetry;
use mdrkit_common::resilience::{RetryConfig, RetryError, RetryExecutor};
use mdrkit_domain::constants::{ORGANIZATION_DELETE_ATTEMPTS, ORGANIZATION_DELETE_DELAY_MS};
use mdrkit_domain::RetrySettings;
use serde_json::json;
use tracing::info;

use crate::api::client::{ApiClient, Bearer};
use crate::api::errors::ApiError;

/// Retry budget for `organizations/delete`
///
/// The backend refuses the delete until every tenant is gone, which
/// propagates slowly, so the call is repeated with a fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrganizationDeleteConfig {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl Default for OrganizationDeleteConfig {
    fn default() -> Self {
        Self {
            max_attempts: ORGANIZATION_DELETE_ATTEMPTS,
            delay: Duration::from_millis(ORGANIZATION_DELETE_DELAY_MS),
        }
    }
}

impl From<&RetrySettings> for OrganizationDeleteConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.organization_delete_attempts,
            delay: Duration::from_millis(settings.organization_delete_delay_ms),
        }
    }
}

/// `organizations/*` endpoints
#[derive(Clone)]
pub struct OrganizationsClient {
    api: Arc<ApiClient>,
    retry: OrganizationDeleteConfig,
}

impl OrganizationsClient {
    /// Organizations client sharing `api`, deleting with the `retry` budget
    pub fn new(api: Arc<ApiClient>, retry: OrganizationDeleteConfig) -> Self {
        Self { api, retry }
    }

    /// Delete everything the portal knows about the current client.
    ///
    /// Status failures are retried up to the configured number of attempts;
    /// any other error ends the loop at once.
    ///
    /// # Errors
    /// `ApiError::RetriesExhausted` carrying the last status failure, or the
    /// first non-status error.
    pub async fn delete(&self) -> Result<(), ApiError> {
        let config = RetryConfig::builder()
            .max_attempts(self.retry.max_attempts)
            .fixed_backoff(self.retry.delay)
            .build()
            .map_err(|err| ApiError::Config(err.to_string()))?;
        let policy = PredicateRetry::new(|err: &ApiError, _attempt: u32| err.is_status_failure());

        let api = &self.api;
        let outcome = RetryExecutor::new(config, policy)
            .execute(|| async move {
                api
                    .call(
                        "organizations",
                        "delete",
                        &json!({}),
                        Bearer::Identity,
                        "Client was not deleted",
                    )
                    .await
            })
            .await;

        match outcome {
            Ok(_) => {
                info!("organization deleted");
                Ok(())
            }
            Err(RetryError::AttemptsExhausted { attempts, source }) => {
                Err(ApiError::RetriesExhausted { attempts, source: Box::new(source) })
            }
            Err(RetryError::NonRetryable { source, .. }) => Err(source),
        }
    }
}
