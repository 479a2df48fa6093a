pub mod config;
pub mod conflict;
pub mod describe;
pub mod error;
pub mod occurrence;
pub mod schedule;
pub mod shift;

pub use crate::config::{SchedulingConfig, DEFAULT_AGENDA_SPAN_DAYS};
pub use crate::conflict::{
    detect_conflicts, detect_conflicts_within, Conflict, DEFAULT_CONFLICT_HORIZON_DAYS,
};
pub use crate::describe::describe_schedule;
pub use crate::error::ScheduleError;
pub use crate::occurrence::{
    due_on, is_scheduled_for, next_occurrence, occurrences_between, Occurrence,
};
pub use crate::schedule::{
    weekday_index, RoutineId, RoutineSchedule, ScheduleKind, ScheduleSpec, Scheduled,
    MAX_INTERVAL_DAYS, MIN_INTERVAL_DAYS,
};
pub use crate::shift::{shift, ShiftDirection};
