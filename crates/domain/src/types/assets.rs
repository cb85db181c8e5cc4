//! Asset request bodies

use serde::Serialize;
use serde_json::Value;

use crate::errors::MdrError;

/// Body of paged list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page_size: u32,
    pub page: u32,
}

impl PageRequest {
    pub fn new(page_size: u32, page: u32) -> Self {
        Self { page_size, page }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetDetailsRequest {
    pub asset_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

impl AssetDetailsRequest {
    pub fn new(asset_id: impl Into<String>) -> Self {
        Self { asset_id: asset_id.into(), fields: None }
    }

    /// Restrict the response to `fields`; an empty list means all fields
    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = (!fields.is_empty()).then_some(fields);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetSuggestionRequest {
    pub search_phrase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenants_names: Option<Vec<String>>,
}

impl AssetSuggestionRequest {
    pub fn new(search_phrase: impl Into<String>) -> Self {
        Self { search_phrase: search_phrase.into(), tenants_names: None }
    }

    pub fn with_tenants(mut self, tenants_names: Vec<String>) -> Self {
        self.tenants_names = (!tenants_names.is_empty()).then_some(tenants_names);
        self
    }
}

/// Body of `assets/list` filtered by host name
///
/// A single name becomes a one-element list; a list passes through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostNames {
    pub host_names: Vec<String>,
}

impl From<&str> for HostNames {
    fn from(name: &str) -> Self {
        Self { host_names: vec![name.to_string()] }
    }
}

impl From<String> for HostNames {
    fn from(name: String) -> Self {
        Self { host_names: vec![name] }
    }
}

impl From<Vec<String>> for HostNames {
    fn from(host_names: Vec<String>) -> Self {
        Self { host_names }
    }
}

impl From<&[&str]> for HostNames {
    fn from(names: &[&str]) -> Self {
        Self { host_names: names.iter().map(|name| (*name).to_string()).collect() }
    }
}

/// Untyped input, e.g. a value read from a scenario file
impl TryFrom<Value> for HostNames {
    type Error = MdrError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(name) => Ok(name.into()),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(name) => Ok(name),
                    other => Err(MdrError::InvalidInput(format!(
                        "host name list entries must be strings, got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::from),
            other => Err(MdrError::InvalidInput(format!(
                "unknown host name type, expected string or list, got {other}"
            ))),
        }
    }
}
