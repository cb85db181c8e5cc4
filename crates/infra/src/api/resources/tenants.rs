use std::sync::Arc;

use mdrkit_domain::TenantRef;
use serde_json::{json, Value};

use crate::api::client::{ApiClient, Bearer};
use crate::api::errors::ApiError;

const RESOURCE: &str = "tenants";

/// `tenants/*` endpoints
#[derive(Clone)]
pub struct TenantsClient {
    api: Arc<ApiClient>,
}

impl TenantsClient {
    /// Tenants client sharing `api`
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn create(&self, tenant: &Value) -> Result<Value, ApiError> {
        self.api.call(RESOURCE, "create", tenant, Bearer::Session, "Tenant has not been created").await
    }

    /// Only works from a session scoped to `tenant`.
    ///
    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn delete(&self, tenant: &TenantRef) -> Result<Value, ApiError> {
        self.api.call(RESOURCE, "delete", tenant, Bearer::Session, "Tenant has not been deleted").await
    }

    /// All tenants of the client; needs the identity token.
    ///
    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn list(&self) -> Result<Value, ApiError> {
        self.api
            .call(RESOURCE, "list", &json!({}), Bearer::Identity, "Tenant list has not been received")
            .await
    }

    /// The `tenants/list` entry whose `tenant_name` equals `name`.
    ///
    /// # Errors
    /// `ApiError::NotFound` if there is no such tenant.
    pub async fn tenant_info(&self, name: &str) -> Result<Value, ApiError> {
        let tenants = self.list().await?;
        tenants
            .as_array()
            .into_iter()
            .flatten()
            .find(|tenant| tenant.get("tenant_name").and_then(Value::as_str) == Some(name))
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("tenant with name {name} has not been found")))
    }
}
