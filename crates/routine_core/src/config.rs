use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::conflict::DEFAULT_CONFLICT_HORIZON_DAYS;

pub const DEFAULT_AGENDA_SPAN_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SchedulingConfig {
    pub conflict_horizon_days: u32,
    pub agenda_span_days: u32,
    /// Wall-clock time at which a due routine's reminder fires.
    pub reminder_time: NaiveTime,
}

impl SchedulingConfig {
    /// Horizon actually scanned; always includes today.
    pub fn effective_horizon_days(&self) -> u32 {
        self.conflict_horizon_days.max(1)
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            conflict_horizon_days: DEFAULT_CONFLICT_HORIZON_DAYS,
            agenda_span_days: DEFAULT_AGENDA_SPAN_DAYS,
            reminder_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
        }
    }
}
