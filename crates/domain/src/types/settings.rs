//! Client settings bodies

use serde::{Deserialize, Serialize};

/// Auto-accept flag for incident responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoResponse {
    pub auto_response: bool,
}
