use thiserror::Error;

use crate::schedule::ScheduleKind;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// The spec does not satisfy the invariants of its kind.
    #[error("invalid schedule configuration: {reason}")]
    InvalidScheduleConfiguration { reason: String },

    /// Only interval schedules have an anchor that can be moved.
    #[error("cannot shift a {kind} schedule; only interval schedules can be shifted")]
    UnsupportedShiftOperation { kind: ScheduleKind },
}

impl ScheduleError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidScheduleConfiguration {
            reason: reason.into(),
        }
    }
}
