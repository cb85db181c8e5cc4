use std::sync::Arc;

use mdrkit_domain::{CommentRef, NewComment};
use serde_json::Value;

use crate::api::client::{ApiClient, Bearer};
use crate::api::errors::ApiError;

/// `comments/*` endpoints
#[derive(Clone)]
pub struct CommentsClient {
    api: Arc<ApiClient>,
}

impl CommentsClient {
    /// Comments client sharing `api`
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn create(&self, comment: &NewComment) -> Result<Value, ApiError> {
        self.api.call("comments", "create", comment, Bearer::Session, "Failed to create comment").await
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn delete(&self, comment: &CommentRef) -> Result<(), ApiError> {
        self.api.call("comments", "delete", comment, Bearer::Session, "Failed to delete comment").await?;
        Ok(())
    }
}
