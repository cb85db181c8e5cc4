//! Domain types and request bodies

pub mod assets;
pub mod comments;
pub mod incidents;
pub mod schedules;
pub mod secret;
pub mod session;
pub mod settings;

pub use assets::{AssetDetailsRequest, AssetSuggestionRequest, HostNames, PageRequest};
pub use comments::{CommentRef, NewComment};
pub use incidents::{
    CloseIncidentRequest, IncidentDetailsRequest, IncidentHistoryQuery, NewIncident,
    SendEmailRequest,
};
pub use schedules::ScheduleType;
pub use secret::Secret;
pub use session::{
    CreateSessionRequest, Credential, Role, Session, SessionIdRequest, SessionPhase,
    SessionSummary, TenantRef,
};
pub use settings::AutoResponse;
