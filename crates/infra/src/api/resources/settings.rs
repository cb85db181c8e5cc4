use std::sync::Arc;

use mdrkit_domain::AutoResponse;
use serde_json::json;

use crate::api::client::{ApiClient, Bearer};
use crate::api::errors::ApiError;

/// `settings/*` endpoints
#[derive(Clone)]
pub struct SettingsClient {
    api: Arc<ApiClient>,
}

impl SettingsClient {
    /// Settings client sharing `api`
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Whether incident responses are accepted automatically.
    ///
    /// # Errors
    /// `ApiError::Api` on any status but 200, `ApiError::Client` if the
    /// payload has no boolean `auto_response`.
    pub async fn auto_accept(&self) -> Result<bool, ApiError> {
        let payload = self
            .api
            .call(
                "settings",
                "auto_response/get",
                &json!({}),
                Bearer::Session,
                "Auto response state has not been received",
            )
            .await?;
        let state: AutoResponse = serde_json::from_value(payload)
            .map_err(|err| ApiError::Client(format!("unexpected auto_response payload: {err}")))?;
        Ok(state.auto_response)
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn set_auto_accept(&self, enabled: bool) -> Result<(), ApiError> {
        self.api
            .call(
                "settings",
                "auto_response/set",
                &AutoResponse { auto_response: enabled },
                Bearer::Session,
                "Auto response state has not been set",
            )
            .await?;
        Ok(())
    }
}
