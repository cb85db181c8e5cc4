//! One client per MDR API resource group
//!
//! All of them share an [`ApiClient`](super::client::ApiClient) and only
//! differ in paths, bodies and which token they send.

pub mod assets;
pub mod comments;
pub mod incidents;
pub mod organizations;
pub mod schedules;
pub mod settings;
pub mod tenants;

pub use assets::AssetsClient;
pub use comments::CommentsClient;
pub use incidents::IncidentsClient;
pub use organizations::{OrganizationDeleteConfig, OrganizationsClient};
pub use schedules::SchedulesClient;
pub use settings::SettingsClient;
pub use tenants::TenantsClient;
