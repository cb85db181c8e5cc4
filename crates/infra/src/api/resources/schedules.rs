use std::sync::Arc;

use mdrkit_domain::ScheduleType;
use serde_json::{json, Value};

use crate::api::client::{ApiClient, Bearer};
use crate::api::errors::ApiError;

const RESOURCE: &str = "schedules";

/// `schedules/*` endpoints, all sent with the identity token
#[derive(Clone)]
pub struct SchedulesClient {
    api: Arc<ApiClient>,
}

impl SchedulesClient {
    /// Schedules client sharing `api`
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn list(&self) -> Result<Value, ApiError> {
        self.api
            .call(RESOURCE, "list", &json!({}), Bearer::Identity, "Schedule list has not been received")
            .await
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn create(&self, schedule: &Value) -> Result<Value, ApiError> {
        self.api
            .call(RESOURCE, "create", schedule, Bearer::Identity, "Schedule has not been created")
            .await
    }

    /// Delete the weekly schedule.
    ///
    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn delete(&self) -> Result<Value, ApiError> {
        self.api
            .call(
                RESOURCE,
                "delete",
                &ScheduleType::weekly(),
                Bearer::Identity,
                "Schedule has not been deleted",
            )
            .await
    }
}
