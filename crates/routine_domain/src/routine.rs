use routine_core::{RoutineId, RoutineSchedule, ScheduleSpec, Scheduled};
use serde::{Deserialize, Serialize};

/// A persisted workout routine. The schedule is committed together with the
/// rest of the record, never on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Routine {
    pub id: RoutineId,
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub exercises: Vec<String>,
    #[serde(default)]
    pub schedule: ScheduleSpec,
}

impl Routine {
    pub fn new(id: impl Into<RoutineId>, name: impl Into<String>, schedule: ScheduleSpec) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            notes: String::new(),
            exercises: Vec::new(),
            schedule,
        }
    }

    pub fn with_exercises<I, S>(mut self, exercises: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exercises = exercises.into_iter().map(Into::into).collect();
        self
    }
}

impl Scheduled for Routine {
    fn routine_id(&self) -> &RoutineId {
        &self.id
    }

    fn routine_name(&self) -> &str {
        &self.name
    }

    fn schedule(&self) -> &ScheduleSpec {
        &self.schedule
    }
}

impl From<&Routine> for RoutineSchedule {
    fn from(routine: &Routine) -> Self {
        RoutineSchedule::new(routine.id.clone(), routine.name.clone(), routine.schedule.clone())
    }
}
