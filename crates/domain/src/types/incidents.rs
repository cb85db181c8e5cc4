//! Incident request bodies

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIncident {
    /// Entries shaped `"<host_name>:<asset_id>"`
    pub affected_hosts: Vec<String>,
    pub client_description: String,
    pub summary: String,
    pub priority: String,
    pub tenant_id: String,
    pub no_sla_flag: bool,
}

impl NewIncident {
    /// HIGH priority incident on the default tenant with SLA tracking on
    pub fn new(
        affected_hosts: Vec<String>,
        client_description: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            affected_hosts,
            client_description: client_description.into(),
            summary: summary.into(),
            priority: "HIGH".to_string(),
            tenant_id: String::new(),
            no_sla_flag: false,
        }
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = priority.into();
        self
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = tenant_id.into();
        self
    }

    pub fn without_sla(mut self) -> Self {
        self.no_sla_flag = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloseIncidentRequest {
    pub incident_id: String,
    pub summary: String,
    pub resolution_status: String,
}

impl CloseIncidentRequest {
    pub fn new(incident_id: impl Into<String>) -> Self {
        Self {
            incident_id: incident_id.into(),
            summary: "Test".to_string(),
            resolution_status: "FALSE_POSITIVE".to_string(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_resolution(mut self, resolution_status: impl Into<String>) -> Self {
        self.resolution_status = resolution_status.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncidentDetailsRequest {
    pub incident_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

impl IncidentDetailsRequest {
    pub fn new(incident_id: impl Into<String>) -> Self {
        Self { incident_id: incident_id.into(), fields: None }
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = (!fields.is_empty()).then_some(fields);
        self
    }
}

/// Filters for `incidents/history`; `None` fields are left out of the body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncidentHistoryQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_self: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_record_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_record_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type_page_size: Option<u32>,
}

impl Default for IncidentHistoryQuery {
    /// Includes the caller's own changes (`ignore_self = false`)
    fn default() -> Self {
        Self {
            ignore_self: Some(false),
            incident_id: None,
            max_record_time: None,
            min_record_time: None,
            page: None,
            entity_type_page_size: None,
        }
    }
}

impl IncidentHistoryQuery {
    pub fn for_incident(incident_id: impl Into<String>) -> Self {
        Self { incident_id: Some(incident_id.into()), ..Self::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendEmailRequest {
    pub issue_key: String,
    pub issue_type: String,
    pub user_email: String,
}
