use routine_core::{RoutineId, ScheduleError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoutineError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("routine `{0}` not found")]
    NotFound(RoutineId),

    #[error("invalid routine: {0}")]
    InvalidRoutine(String),

    /// The persistence layer rejected a read or commit.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type Result<T, E = RoutineError> = std::result::Result<T, E>;
