use std::sync::Arc;

use mdrkit_domain::{AssetDetailsRequest, AssetSuggestionRequest, HostNames, PageRequest};
use serde_json::{json, Value};

use crate::api::client::{ApiClient, Bearer};
use crate::api::errors::ApiError;

const RESOURCE: &str = "assets";

/// `assets/*` endpoints
#[derive(Clone)]
pub struct AssetsClient {
    api: Arc<ApiClient>,
}

impl AssetsClient {
    /// Assets client sharing `api`
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Number of assets matching `filter` (all assets without one).
    ///
    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn count(&self, filter: Option<&Value>) -> Result<Value, ApiError> {
        let empty = json!({});
        let body = filter.unwrap_or(&empty);
        self.api.call(RESOURCE, "count", body, Bearer::Session, "Asset count has not been received").await
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn details(&self, request: &AssetDetailsRequest) -> Result<Value, ApiError> {
        self.api
            .call(RESOURCE, "details", request, Bearer::Session, "Asset details have not been received")
            .await
    }

    /// Assets with the given host names.
    ///
    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn asset(&self, host_names: impl Into<HostNames>) -> Result<Value, ApiError> {
        let body = host_names.into();
        self.api.call(RESOURCE, "list", &body, Bearer::Session, "Assets list has not been received").await
    }

    /// Like [`asset`](Self::asset) for host names coming from untyped JSON:
    /// a string or a list of strings.
    ///
    /// # Errors
    /// `ApiError::Validation` for any other shape, before a request is sent.
    pub async fn asset_untyped(&self, host_names: Value) -> Result<Value, ApiError> {
        let host_names = HostNames::try_from(host_names)?;
        self.asset(host_names).await
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn all_assets(&self, page: PageRequest) -> Result<Value, ApiError> {
        self.api.call(RESOURCE, "list", &page, Bearer::Session, "Assets page has not been received").await
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn suggestion(&self, request: &AssetSuggestionRequest) -> Result<Value, ApiError> {
        self.api
            .call(RESOURCE, "suggestion", request, Bearer::Session, "Suggestion has not been received")
            .await
    }
}
