use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use parking_lot::RwLock;
use routine_core::{
    describe_schedule, detect_conflicts_within, due_on, next_occurrence, occurrences_between,
    shift, Conflict, Occurrence, RoutineId, RoutineSchedule, ScheduleSpec, SchedulingConfig,
    ShiftDirection,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, RoutineError};
use crate::notifications::{ReminderRequest, ReminderSink};
use crate::routine::Routine;
use crate::store::{MemoryRoutineStore, RoutineStore};

const PREVIEW_OCCURRENCES: usize = 5;

/// What the routine editor shows under the schedule picker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulePreview {
    pub description: String,
    pub next_occurrence: Option<NaiveDate>,
    pub upcoming: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaveReport {
    pub routine_id: RoutineId,
    pub next_occurrence: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgendaDay {
    pub date: NaiveDate,
    pub entries: Vec<Occurrence>,
}

pub struct RoutineService {
    store: Box<dyn RoutineStore>,
    routines: RwLock<HashMap<RoutineId, Routine>>,
    reminder_sink: Option<Box<dyn ReminderSink>>,
    config: SchedulingConfig,
}

pub struct RoutineServiceBuilder {
    store: Option<Box<dyn RoutineStore>>,
    reminder_sink: Option<Box<dyn ReminderSink>>,
    config: SchedulingConfig,
}

impl Default for RoutineServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutineServiceBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            reminder_sink: None,
            config: SchedulingConfig::default(),
        }
    }

    pub fn with_store(mut self, store: Box<dyn RoutineStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_reminder_sink(mut self, sink: Box<dyn ReminderSink>) -> Self {
        self.reminder_sink = Some(sink);
        self
    }

    pub fn with_config(mut self, config: SchedulingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<RoutineService> {
        let service = RoutineService {
            store: self
                .store
                .unwrap_or_else(|| Box::new(MemoryRoutineStore::new())),
            routines: RwLock::new(HashMap::new()),
            reminder_sink: self.reminder_sink,
            config: self.config,
        };
        service.reload_all()?;
        Ok(service)
    }
}

impl RoutineService {
    pub fn builder() -> RoutineServiceBuilder {
        RoutineServiceBuilder::new()
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    pub fn reload_all(&self) -> Result<()> {
        let loaded = self.store.load_all()?;
        let mut routines = self.routines.write();
        routines.clear();
        for routine in loaded {
            if let Err(err) = routine.schedule.validate() {
                warn!(routine = %routine.id, %err, "loaded routine has an invalid schedule");
            }
            routines.insert(routine.id.clone(), routine);
        }
        debug!(count = routines.len(), "routines loaded");
        Ok(())
    }

    /// All routines, ordered by name.
    pub fn routines(&self) -> Vec<Routine> {
        let mut routines: Vec<Routine> = self.routines.read().values().cloned().collect();
        routines.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        routines
    }

    pub fn routine(&self, id: &RoutineId) -> Result<Routine> {
        self.routines
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| RoutineError::NotFound(id.clone()))
    }

    pub fn preview(&self, spec: &ScheduleSpec, today: NaiveDate) -> Result<SchedulePreview> {
        let next = next_occurrence(spec, today)?;
        let end = today
            .checked_add_signed(Duration::days(i64::from(
                self.config.effective_horizon_days(),
            )))
            .unwrap_or(NaiveDate::MAX);
        let mut upcoming = occurrences_between(spec, today, end)?;
        upcoming.truncate(PREVIEW_OCCURRENCES);
        Ok(SchedulePreview {
            description: describe_schedule(spec),
            next_occurrence: next,
            upcoming,
        })
    }

    /// Advisory overlap check for a schedule that is about to be saved.
    #[instrument(skip(self, candidate))]
    pub fn check_conflicts(
        &self,
        candidate: &ScheduleSpec,
        excluding: Option<&RoutineId>,
        today: NaiveDate,
    ) -> Result<Vec<Conflict>> {
        let others = self.schedules();
        let conflicts = detect_conflicts_within(
            candidate,
            excluding,
            &others,
            today,
            self.config.effective_horizon_days(),
        )?;
        if !conflicts.is_empty() {
            debug!(count = conflicts.len(), "schedule overlaps other routines");
        }
        Ok(conflicts)
    }

    /// Validates and commits `routine`. Conflicts are not checked here; call
    /// [`RoutineService::check_conflicts`] first and let the user decide.
    ///
    /// Mutations hold the cache write guard from read to cache update, so the
    /// cache and the store always agree on the last committed record.
    #[instrument(skip(self, routine), fields(routine = %routine.id))]
    pub fn save_routine(&self, routine: Routine, today: NaiveDate) -> Result<SaveReport> {
        if routine.name.trim().is_empty() {
            return Err(RoutineError::InvalidRoutine(
                "routine name must not be empty".to_string(),
            ));
        }
        routine.schedule.validate()?;
        let next = next_occurrence(&routine.schedule, today)?;

        let mut routines = self.routines.write();
        self.store.commit(&routine)?;
        info!(schedule = %describe_schedule(&routine.schedule), "routine saved");
        self.refresh_reminder(&routine, next);

        let report = SaveReport {
            routine_id: routine.id.clone(),
            next_occurrence: next,
        };
        routines.insert(routine.id.clone(), routine);
        Ok(report)
    }

    #[instrument(skip(self))]
    pub fn delete_routine(&self, id: &RoutineId) -> Result<Routine> {
        let mut routines = self.routines.write();
        let existing = routines
            .get(id)
            .cloned()
            .ok_or_else(|| RoutineError::NotFound(id.clone()))?;
        self.store.remove(id)?;
        routines.remove(id);
        if let Some(sink) = &self.reminder_sink {
            sink.clear_for_routine(id);
        }
        info!("routine deleted");
        Ok(existing)
    }

    /// Moves an interval routine's cycle by one day and persists it.
    ///
    /// The cached routine only changes once the store accepted the commit.
    #[instrument(skip(self))]
    pub fn shift_routine(
        &self,
        id: &RoutineId,
        direction: ShiftDirection,
        today: NaiveDate,
    ) -> Result<NaiveDate> {
        let mut routines = self.routines.write();
        let mut routine = routines
            .get(id)
            .cloned()
            .ok_or_else(|| RoutineError::NotFound(id.clone()))?;
        let anchor = shift(&routine.schedule, direction)?;
        routine.schedule = routine.schedule.with_anchor(anchor);
        let next = next_occurrence(&routine.schedule, today)?;

        self.store.commit(&routine)?;
        info!(%anchor, "routine anchor shifted");
        self.refresh_reminder(&routine, next);
        routines.insert(routine.id.clone(), routine);
        Ok(anchor)
    }

    /// Routines due on `date`, ordered by name.
    pub fn due_on(&self, date: NaiveDate) -> Vec<Occurrence> {
        due_on(&self.schedules(), date)
    }

    /// Day-by-day view of what is due from `today` for `span_days` days.
    pub fn agenda(&self, today: NaiveDate, span_days: u32) -> Vec<AgendaDay> {
        let routines = self.schedules();
        today
            .iter_days()
            .take(span_days as usize)
            .map(|date| AgendaDay {
                date,
                entries: due_on(&routines, date),
            })
            .collect()
    }

    /// Scheduling view of every routine, ordered by name.
    fn schedules(&self) -> Vec<RoutineSchedule> {
        let mut schedules: Vec<RoutineSchedule> = self
            .routines
            .read()
            .values()
            .map(RoutineSchedule::from)
            .collect();
        schedules.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        schedules
    }

    fn refresh_reminder(&self, routine: &Routine, next: Option<NaiveDate>) {
        let Some(sink) = &self.reminder_sink else {
            return;
        };
        sink.clear_for_routine(&routine.id);
        if let Some(date) = next {
            sink.schedule(ReminderRequest {
                routine_id: routine.id.clone(),
                title: format!("Workout: {}", routine.name),
                body: format!("{} · due {}", describe_schedule(&routine.schedule), date),
                scheduled_for: date.and_time(self.config.reminder_time),
            });
        }
    }
}
