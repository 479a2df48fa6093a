use chrono::NaiveDateTime;
use routine_core::RoutineId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderRequest {
    pub routine_id: RoutineId,
    pub title: String,
    pub body: String,
    /// Local wall-clock time.
    pub scheduled_for: NaiveDateTime,
}

/// Platform-specific reminder adapters will implement this trait.
pub trait ReminderSink: Send + Sync {
    fn schedule(&self, reminder: ReminderRequest);
    fn clear_for_routine(&self, routine_id: &RoutineId);
}
