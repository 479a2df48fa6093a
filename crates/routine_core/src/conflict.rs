use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ScheduleError;
use crate::occurrence::fires_on;
use crate::schedule::{RoutineId, ScheduleKind, ScheduleSpec, Scheduled};

/// Days scanned ahead of today when looking for overlapping routines.
///
/// Covers at least one full cycle of any weekly schedule and of any interval
/// schedule up to the 30 day maximum, with room to spare.
pub const DEFAULT_CONFLICT_HORIZON_DAYS: u32 = 60;

/// Another routine that is due on the same day as the candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conflict {
    pub date: NaiveDate,
    pub routine_id: RoutineId,
    pub routine_name: String,
}

pub fn detect_conflicts<'a, R, I>(
    candidate: &ScheduleSpec,
    excluding: Option<&RoutineId>,
    others: I,
    today: NaiveDate,
) -> Result<Vec<Conflict>, ScheduleError>
where
    R: Scheduled + 'a,
    I: IntoIterator<Item = &'a R>,
{
    detect_conflicts_within(
        candidate,
        excluding,
        others,
        today,
        DEFAULT_CONFLICT_HORIZON_DAYS,
    )
}

/// Reports each routine that shares a due day with `candidate` in
/// `[today, today + horizon_days)`, once, at its earliest shared day.
///
/// Results are ordered by date, then by the order of `others`. The routine
/// being edited is passed as `excluding` so it never conflicts with itself.
/// Only an invalid `candidate` is an error; stored routines with invalid specs
/// are skipped.
pub fn detect_conflicts_within<'a, R, I>(
    candidate: &ScheduleSpec,
    excluding: Option<&RoutineId>,
    others: I,
    today: NaiveDate,
    horizon_days: u32,
) -> Result<Vec<Conflict>, ScheduleError>
where
    R: Scheduled + 'a,
    I: IntoIterator<Item = &'a R>,
{
    candidate.validate()?;
    if candidate.kind == ScheduleKind::None {
        return Ok(Vec::new());
    }

    let others: Vec<&R> = others
        .into_iter()
        .filter(|routine| excluding != Some(routine.routine_id()))
        .filter(|routine| routine.schedule().kind != ScheduleKind::None)
        .filter(|routine| match routine.schedule().validate() {
            Ok(()) => true,
            Err(err) => {
                warn!(routine = %routine.routine_id(), %err, "ignoring routine with invalid schedule");
                false
            }
        })
        .collect();
    if others.is_empty() {
        return Ok(Vec::new());
    }

    let mut reported: HashSet<&RoutineId> = HashSet::new();
    let mut conflicts = Vec::new();
    for offset in 0..i64::from(horizon_days) {
        // The scan ends early if the horizon runs past the last representable date.
        let Some(day) = today.checked_add_signed(Duration::days(offset)) else {
            break;
        };
        if !fires_on(candidate, day)? {
            continue;
        }
        for routine in &others {
            if reported.contains(routine.routine_id()) {
                continue;
            }
            if fires_on(routine.schedule(), day)? {
                reported.insert(routine.routine_id());
                conflicts.push(Conflict {
                    date: day,
                    routine_id: routine.routine_id().clone(),
                    routine_name: routine.routine_name().to_string(),
                });
            }
        }
        if reported.len() == others.len() {
            break;
        }
    }

    debug!(
        count = conflicts.len(),
        horizon_days, "conflict scan finished"
    );
    Ok(conflicts)
}
