use std::sync::Arc;

use mdrkit_domain::{
    CloseIncidentRequest, IncidentDetailsRequest, IncidentHistoryQuery, NewIncident,
    SendEmailRequest,
};
use serde_json::{json, Map, Value};

use crate::api::client::{ApiClient, Bearer};
use crate::api::errors::ApiError;

const RESOURCE: &str = "incidents";

/// `incidents/*` endpoints
#[derive(Clone)]
pub struct IncidentsClient {
    api: Arc<ApiClient>,
}

impl IncidentsClient {
    /// Incidents client sharing `api`
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn create(&self, incident: &NewIncident) -> Result<Value, ApiError> {
        self.api.call(RESOURCE, "create", incident, Bearer::Session, "Incident has not been created").await
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn count(&self, filter: Option<&Value>) -> Result<Value, ApiError> {
        let empty = json!({});
        self.api
            .call(
                RESOURCE,
                "count",
                filter.unwrap_or(&empty),
                Bearer::Session,
                "Incident count has not been received",
            )
            .await
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn details(&self, request: &IncidentDetailsRequest) -> Result<Value, ApiError> {
        self.api
            .call(RESOURCE, "details", request, Bearer::Session, "Incident details have not been received")
            .await
    }

    /// One page of incidents. Keys in `filter` are merged into the body and
    /// win over `page_size`/`page`.
    ///
    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn list(
        &self,
        page_size: u32,
        page: u32,
        filter: Option<&Map<String, Value>>,
    ) -> Result<Value, ApiError> {
        let mut body = Map::new();
        body.insert("page_size".into(), json!(page_size));
        body.insert("page".into(), json!(page));
        if let Some(filter) = filter {
            body.extend(filter.iter().map(|(key, value)| (key.clone(), value.clone())));
        }

        self.api
            .call(RESOURCE, "list", &body, Bearer::Session, "Incidents list has not been received")
            .await
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn close(&self, request: &CloseIncidentRequest) -> Result<Value, ApiError> {
        self.api.call(RESOURCE, "close", request, Bearer::Session, "Incident has not been closed").await
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn history(&self, query: &IncidentHistoryQuery) -> Result<Value, ApiError> {
        self.api.call(RESOURCE, "history", query, Bearer::Session, "History has not been received").await
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn send_email(&self, request: &SendEmailRequest) -> Result<(), ApiError> {
        self.api
            .call(RESOURCE, "send/email", request, Bearer::Session, "Incident e-mail has not been sent")
            .await?;
        Ok(())
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn sla_count(&self, filter: Option<&Value>) -> Result<Value, ApiError> {
        let empty = json!({});
        self.api
            .call(
                RESOURCE,
                "sla_count",
                filter.unwrap_or(&empty),
                Bearer::Session,
                "SLA count has not been received",
            )
            .await
    }
}
