use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

pub const MIN_INTERVAL_DAYS: i64 = 1;
pub const MAX_INTERVAL_DAYS: i64 = 30;

/// Weekday indices run 0 = Sunday through 6 = Saturday.
const WEEKDAY_COUNT: u8 = 7;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    #[default]
    None,
    Weekly,
    Interval,
}

impl fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScheduleKind::None => "none",
            ScheduleKind::Weekly => "weekly",
            ScheduleKind::Interval => "interval",
        };
        f.write_str(label)
    }
}

/// Recurrence configuration attached to a routine.
///
/// The struct mirrors the persisted fields one to one, so a spec read back from
/// storage may be malformed. Fields that do not belong to `kind` are ignored.
/// Run [`ScheduleSpec::validate`] before trusting a spec from the outside.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleSpec {
    pub kind: ScheduleKind,
    #[serde(default)]
    pub days: BTreeSet<u8>,
    #[serde(default = "default_interval_days")]
    pub interval_days: i64,
    #[serde(default)]
    pub anchor_date: Option<NaiveDate>,
}

fn default_interval_days() -> i64 {
    MIN_INTERVAL_DAYS
}

impl Default for ScheduleSpec {
    fn default() -> Self {
        Self::none()
    }
}

impl ScheduleSpec {
    pub fn none() -> Self {
        Self {
            kind: ScheduleKind::None,
            days: BTreeSet::new(),
            interval_days: default_interval_days(),
            anchor_date: None,
        }
    }

    pub fn weekly(days: impl IntoIterator<Item = u8>) -> Self {
        Self {
            kind: ScheduleKind::Weekly,
            days: days.into_iter().collect(),
            ..Self::none()
        }
    }

    pub fn interval(interval_days: i64, anchor_date: NaiveDate) -> Self {
        Self {
            kind: ScheduleKind::Interval,
            interval_days,
            anchor_date: Some(anchor_date),
            ..Self::none()
        }
    }

    /// Copy of this spec with a different anchor. Used to apply a shift.
    pub fn with_anchor(&self, anchor_date: NaiveDate) -> Self {
        Self {
            anchor_date: Some(anchor_date),
            ..self.clone()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        match self.kind {
            ScheduleKind::None => Ok(()),
            ScheduleKind::Weekly => {
                if self.days.is_empty() {
                    return Err(ScheduleError::invalid(
                        "weekly schedule requires at least one day",
                    ));
                }
                if let Some(day) = self.days.iter().find(|day| **day >= WEEKDAY_COUNT) {
                    return Err(ScheduleError::invalid(format!(
                        "weekday index {day} is outside 0..=6"
                    )));
                }
                Ok(())
            }
            ScheduleKind::Interval => {
                if !(MIN_INTERVAL_DAYS..=MAX_INTERVAL_DAYS).contains(&self.interval_days) {
                    return Err(ScheduleError::invalid(format!(
                        "interval of {} days is outside {}..={}",
                        self.interval_days, MIN_INTERVAL_DAYS, MAX_INTERVAL_DAYS
                    )));
                }
                if self.anchor_date.is_none() {
                    return Err(ScheduleError::invalid(
                        "interval schedule requires an anchor date",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Anchor of an interval spec, or an error when it is missing.
    pub(crate) fn require_anchor(&self) -> Result<NaiveDate, ScheduleError> {
        self.anchor_date
            .ok_or_else(|| ScheduleError::invalid("interval schedule requires an anchor date"))
    }
}

pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct RoutineId(String);

impl RoutineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoutineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoutineId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RoutineId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Read-only view of a persisted routine, as far as scheduling is concerned.
pub trait Scheduled {
    fn routine_id(&self) -> &RoutineId;
    fn routine_name(&self) -> &str;
    fn schedule(&self) -> &ScheduleSpec;
}

/// Minimal routine record: identifier, display name and schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoutineSchedule {
    pub id: RoutineId,
    pub name: String,
    pub spec: ScheduleSpec,
}

impl RoutineSchedule {
    pub fn new(id: impl Into<RoutineId>, name: impl Into<String>, spec: ScheduleSpec) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            spec,
        }
    }
}

impl Scheduled for RoutineSchedule {
    fn routine_id(&self) -> &RoutineId {
        &self.id
    }

    fn routine_name(&self) -> &str {
        &self.name
    }

    fn schedule(&self) -> &ScheduleSpec {
        &self.spec
    }
}
