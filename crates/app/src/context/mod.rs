//! MDR manager - one object wiring the session manager and every resource
//! client together
//!
//! Resource clients are public fields for direct endpoint access; the
//! methods here add pagination, lookups and cross-resource flows.

mod selectors;

use std::sync::Arc;

use mdrkit_domain::constants::{
    ASSETS_PAGE_SIZE, INCIDENTS_MAX_PAGE, INCIDENTS_PAGE_SIZE, WEEKLY_SCHEDULE,
};
use mdrkit_domain::{
    AssetDetailsRequest, AssetSuggestionRequest, CloseIncidentRequest, CommentRef, Credential,
    IncidentDetailsRequest, IncidentHistoryQuery, MdrConfig, NewComment, NewIncident,
    PageRequest, Secret, SendEmailRequest, TenantRef,
};
use mdrkit_infra::{
    AccessTokenProvider, ApiClient, ApiClientConfig, ApiError, AssetsClient, CommentsClient,
    HttpClient, IncidentsClient, OrganizationDeleteConfig, OrganizationsClient, SchedulesClient,
    SessionManager, SessionManagerConfig, SettingsClient, TenantsClient,
};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

/// Overrides for [`MdrManager::login`]; unset fields fall back to the
/// configured account. The client id sticks to the last one used.
#[derive(Debug, Clone, Default)]
pub struct LoginOptions {
    /// Login instead of the configured account's
    pub login: Option<String>,
    /// Password for `login`
    pub password: Option<Secret>,
    /// Client to scope the session to
    pub client_id: Option<String>,
    /// Tenant scope; root scope when unset
    pub tenants: Option<Vec<TenantRef>>,
}

/// Facade over the MDR API
pub struct MdrManager {
    /// Configuration the manager was built from
    pub config: MdrConfig,
    /// Session lifecycle, shared with every resource client
    pub sessions: Arc<SessionManager>,
    /// `assets/*`
    pub assets: AssetsClient,
    /// `incidents/*`
    pub incidents: IncidentsClient,
    /// `comments/*`
    pub comments: CommentsClient,
    /// `tenants/*`
    pub tenants: TenantsClient,
    /// `schedules/*`
    pub schedules: SchedulesClient,
    /// `organizations/*`
    pub organizations: OrganizationsClient,
    /// `settings/*`
    pub settings: SettingsClient,
}

impl MdrManager {
    /// Wire the clients without logging in.
    ///
    /// # Errors
    /// `ApiError::Config` if the HTTP client cannot be built.
    pub fn new(config: MdrConfig) -> Result<Self, ApiError> {
        let http = Arc::new(HttpClient::from_settings(&config.api)?);
        let sessions = Arc::new(SessionManager::new(
            SessionManagerConfig::from(&config),
            Arc::clone(&http),
        ));
        let auth: Arc<dyn AccessTokenProvider> = sessions.clone();
        let api = Arc::new(ApiClient::new(ApiClientConfig::from_settings(&config.api), http, auth));

        Ok(Self {
            sessions,
            assets: AssetsClient::new(Arc::clone(&api)),
            incidents: IncidentsClient::new(Arc::clone(&api)),
            comments: CommentsClient::new(Arc::clone(&api)),
            tenants: TenantsClient::new(Arc::clone(&api)),
            schedules: SchedulesClient::new(Arc::clone(&api)),
            settings: SettingsClient::new(Arc::clone(&api)),
            organizations: OrganizationsClient::new(
                api,
                OrganizationDeleteConfig::from(&config.retry),
            ),
            config,
        })
    }

    /// Build the manager and log in with the configured account.
    ///
    /// # Errors
    /// See [`new`](Self::new) and [`login`](Self::login).
    pub async fn connect(config: MdrConfig) -> Result<Self, ApiError> {
        let manager = Self::new(config)?;
        manager.login(LoginOptions::default()).await?;
        Ok(manager)
    }

    /// Log in, replacing (and deleting) the current session.
    ///
    /// # Errors
    /// Propagates the failing login step.
    pub async fn login(&self, options: LoginOptions) -> Result<(), ApiError> {
        let account = &self.config.account;
        let client_id = match options.client_id {
            Some(client_id) => client_id,
            None => self
                .sessions
                .credential()
                .await
                .map_or_else(|| account.client_id.clone(), |credential| credential.client_id),
        };

        let mut credential = Credential::new(
            options.login.unwrap_or_else(|| account.login.clone()),
            options.password.unwrap_or_else(|| account.password.clone()),
            client_id,
        );
        if let Some(tenants) = options.tenants {
            credential = credential.with_tenants(tenants);
        }
        self.sessions.login(credential).await
    }

    /// Credential of the current login, or the configured account
    async fn base_credential(&self) -> Credential {
        self.sessions.credential().await.unwrap_or_else(|| self.config.account.credential())
    }

    /// Delete a tenant: a root-scoped session cannot see it, so log in
    /// scoped to the tenant, delete it, then log back in with the root scope.
    ///
    /// # Errors
    /// Propagates login and delete failures.
    #[instrument(skip(self))]
    pub async fn delete_tenant(&self, tenant_id: &str) -> Result<(), ApiError> {
        let tenant = TenantRef::new(tenant_id);
        let base = self.base_credential().await;

        self.sessions.login(base.clone().with_tenants(vec![tenant.clone()])).await?;
        self.tenants.delete(&tenant).await?;
        self.sessions.login(base.with_tenants(vec![TenantRef::root()])).await?;

        info!(tenant_id, "tenant deleted");
        Ok(())
    }

    /// Delete the weekly schedule if there is one. Returns whether it existed.
    ///
    /// # Errors
    /// Propagates list and delete failures.
    pub async fn delete_schedules(&self) -> Result<bool, ApiError> {
        let schedules = selectors::into_items(self.schedules.list().await?, "schedules/list")?;
        let weekly = schedules
            .iter()
            .any(|schedule| schedule.get("type").and_then(Value::as_str) == Some(WEEKLY_SCHEDULE));
        if weekly {
            self.schedules.delete().await?;
        }
        Ok(weekly)
    }

    // Assets

    /// Every asset, paging with the maximum page size until the first empty
    /// page.
    ///
    /// # Errors
    /// Stops at the first failing page.
    #[instrument(skip(self))]
    pub async fn fetch_all_assets(&self) -> Result<Vec<Value>, ApiError> {
        let mut assets = Vec::new();
        for page in 1.. {
            let batch = self.assets.all_assets(PageRequest::new(ASSETS_PAGE_SIZE, page)).await?;
            let items = selectors::into_items(batch, "assets/list")?;
            if items.is_empty() {
                break;
            }
            debug!(page, count = items.len(), "assets page received");
            assets.extend(items);
        }
        Ok(assets)
    }

    /// # Errors
    /// `ApiError::NotFound` if no asset has exactly this host name.
    pub async fn asset_id_by_hostname(&self, host_name: &str) -> Result<String, ApiError> {
        let assets = self.fetch_all_assets().await?;
        let asset = selectors::find_by_hostname(&assets, host_name).ok_or_else(|| {
            ApiError::NotFound(format!("host name {host_name} was not found"))
        })?;
        selectors::asset_id(asset)
    }

    /// `(host_name, asset_id)` of a random asset
    ///
    /// # Errors
    /// `ApiError::NotFound` if there are no assets.
    pub async fn random_asset(&self) -> Result<(String, String), ApiError> {
        let assets = self.fetch_all_assets().await?;
        let asset = selectors::pick_random(&assets)
            .ok_or_else(|| ApiError::NotFound("there are no assets".into()))?;
        let host_name = asset.get("host_name").and_then(Value::as_str).unwrap_or_default();
        Ok((host_name.to_string(), selectors::asset_id(asset)?))
    }

    /// Assets whose host name contains `name` upper-cased
    ///
    /// # Errors
    /// See [`fetch_all_assets`](Self::fetch_all_assets).
    pub async fn assets_by_hostname(&self, name: &str) -> Result<Vec<Value>, ApiError> {
        Ok(selectors::filter_by_hostname(self.fetch_all_assets().await?, name))
    }

    /// Asset id of the most recently seen asset matching `name`
    ///
    /// # Errors
    /// `ApiError::NotFound` if nothing matches.
    pub async fn latest_asset_id_by_hostname(&self, name: &str) -> Result<String, ApiError> {
        let assets = self.assets_by_hostname(name).await?;
        let latest = selectors::latest_seen(&assets)
            .ok_or_else(|| ApiError::NotFound(format!("no asset host name contains {name}")))?;
        selectors::asset_id(latest)
    }

    /// Assets on `platform` with `product` installed, oldest first
    ///
    /// # Errors
    /// See [`fetch_all_assets`](Self::fetch_all_assets).
    pub async fn assets_by_last_seen(
        &self,
        platform: &str,
        product: &str,
    ) -> Result<Vec<Value>, ApiError> {
        Ok(selectors::filter_by_platform(self.fetch_all_assets().await?, platform, product))
    }

    /// # Errors
    /// See [`fetch_all_assets`](Self::fetch_all_assets).
    pub async fn hostnames_by_status(&self, status: &str) -> Result<Vec<String>, ApiError> {
        Ok(selectors::hostnames_with_status(&self.fetch_all_assets().await?, status))
    }

    /// # Errors
    /// `ApiError::Client` if the payload has no numeric `count`.
    pub async fn assets_count(&self, filter: Option<&Value>) -> Result<u64, ApiError> {
        selectors::count_field(&self.assets.count(filter).await?, "assets/count")
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn asset_details(
        &self,
        asset_id: &str,
        fields: Vec<String>,
    ) -> Result<Value, ApiError> {
        self.assets.details(&AssetDetailsRequest::new(asset_id).with_fields(fields)).await
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn asset_suggestions(
        &self,
        search_phrase: &str,
        tenants_names: Vec<String>,
    ) -> Result<Value, ApiError> {
        self.assets
            .suggestion(&AssetSuggestionRequest::new(search_phrase).with_tenants(tenants_names))
            .await
    }

    // Organizations

    /// # Errors
    /// See [`OrganizationsClient::delete`].
    pub async fn delete_organizations(&self) -> Result<(), ApiError> {
        self.organizations.delete().await
    }

    // Incidents

    /// Pages `1..=max_page`, all of them, concatenated. Empty pages do not
    /// stop the loop.
    ///
    /// # Errors
    /// Stops at the first failing page.
    #[instrument(skip(self, filter))]
    pub async fn fetch_incidents_page_range(
        &self,
        page_size: u32,
        max_page: u32,
        filter: Option<&Map<String, Value>>,
    ) -> Result<Vec<Value>, ApiError> {
        let mut incidents = Vec::new();
        for page in 1..=max_page {
            let batch = self.incidents.list(page_size, page, filter).await?;
            incidents.extend(selectors::into_items(batch, "incidents/list")?);
        }
        Ok(incidents)
    }

    /// # Errors
    /// See [`fetch_incidents_page_range`](Self::fetch_incidents_page_range).
    pub async fn get_all_incidents(&self) -> Result<Vec<Value>, ApiError> {
        self.fetch_incidents_page_range(INCIDENTS_PAGE_SIZE, INCIDENTS_MAX_PAGE, None).await
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn create_incident(&self, incident: &NewIncident) -> Result<Value, ApiError> {
        self.incidents.create(incident).await
    }

    /// # Errors
    /// `ApiError::Client` if the payload has no numeric `count`.
    pub async fn incident_count(&self, filter: Option<&Value>) -> Result<u64, ApiError> {
        selectors::count_field(&self.incidents.count(filter).await?, "incidents/count")
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn close_incident(&self, request: &CloseIncidentRequest) -> Result<Value, ApiError> {
        self.incidents.close(request).await
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn incident_details(
        &self,
        incident_id: &str,
        fields: Vec<String>,
    ) -> Result<Value, ApiError> {
        self.incidents.details(&IncidentDetailsRequest::new(incident_id).with_fields(fields)).await
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn incident_send_email(&self, request: &SendEmailRequest) -> Result<(), ApiError> {
        self.incidents.send_email(request).await
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn incident_sla_count(&self, filter: Option<&Value>) -> Result<Value, ApiError> {
        self.incidents.sla_count(filter).await
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn incidents_history(&self, query: &IncidentHistoryQuery) -> Result<Value, ApiError> {
        self.incidents.history(query).await
    }

    // Comments

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn create_comment(
        &self,
        incident_id: &str,
        text: &str,
        markdown_to_html: bool,
    ) -> Result<Value, ApiError> {
        let comment = NewComment::new(incident_id, text);
        let comment = if markdown_to_html { comment.markdown() } else { comment };
        self.comments.create(&comment).await
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn delete_comment(&self, comment_id: &str) -> Result<(), ApiError> {
        self.comments.delete(&CommentRef::new(comment_id)).await
    }

    // Settings

    /// # Errors
    /// See [`SettingsClient::auto_accept`].
    pub async fn auto_accept(&self) -> Result<bool, ApiError> {
        self.settings.auto_accept().await
    }

    /// # Errors
    /// `ApiError::Api` on any status but 200.
    pub async fn set_auto_accept(&self, enabled: bool) -> Result<(), ApiError> {
        self.settings.set_auto_accept(enabled).await
    }

    // Sessions

    /// # Errors
    /// See [`SessionManager::delete_sessions`].
    pub async fn delete_sessions(&self, exclude: &[&str], exclude_key: &str) -> Result<usize, ApiError> {
        self.sessions.delete_sessions(exclude, exclude_key).await
    }

    /// # Errors
    /// See [`SessionManager::delete_extra_sessions`].
    pub async fn delete_extra_sessions(&self) -> Result<usize, ApiError> {
        self.sessions.delete_extra_sessions().await
    }

    /// # Errors
    /// See [`SessionManager::rotate_session`].
    pub async fn rotate_session(&self, token: Option<&Secret>) -> Result<(), ApiError> {
        self.sessions.rotate_session(token).await
    }
}
