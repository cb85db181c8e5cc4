//! Report schedule bodies

use serde::{Deserialize, Serialize};

use crate::constants::WEEKLY_SCHEDULE;

/// Schedule selector, serialized as `{"type": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleType {
    #[serde(rename = "type")]
    pub schedule_type: String,
}

impl ScheduleType {
    pub fn weekly() -> Self {
        Self { schedule_type: WEEKLY_SCHEDULE.to_string() }
    }

    pub fn is_weekly(&self) -> bool {
        self.schedule_type == WEEKLY_SCHEDULE
    }
}
