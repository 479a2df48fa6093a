use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::occurrence::offset_days;
use crate::schedule::{ScheduleKind, ScheduleSpec};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShiftDirection {
    Forward,
    Backward,
}

impl ShiftDirection {
    fn days(self) -> i64 {
        match self {
            ShiftDirection::Forward => 1,
            ShiftDirection::Backward => -1,
        }
    }
}

impl From<bool> for ShiftDirection {
    fn from(forward: bool) -> Self {
        if forward {
            ShiftDirection::Forward
        } else {
            ShiftDirection::Backward
        }
    }
}

/// Moves an interval schedule's cycle by one day and returns the new anchor.
///
/// The interval itself is untouched and nothing is written back; apply the
/// result with [`ScheduleSpec::with_anchor`] and persist it together with the
/// rest of the routine.
pub fn shift(spec: &ScheduleSpec, direction: ShiftDirection) -> Result<NaiveDate, ScheduleError> {
    if spec.kind != ScheduleKind::Interval {
        return Err(ScheduleError::UnsupportedShiftOperation { kind: spec.kind });
    }
    spec.validate()?;
    offset_days(spec.require_anchor()?, direction.days())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occurrence::occurrences_between;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn shifting_leg_day_forward_moves_the_whole_cycle() {
        let spec = ScheduleSpec::interval(3, date(2025, 1, 1));
        let anchor = shift(&spec, ShiftDirection::Forward).unwrap();
        assert_eq!(anchor, date(2025, 1, 2));

        let shifted = spec.with_anchor(anchor);
        assert_eq!(shifted.interval_days, 3);
        assert_eq!(
            occurrences_between(&shifted, date(2025, 1, 1), date(2025, 1, 9)).unwrap(),
            vec![date(2025, 1, 2), date(2025, 1, 5), date(2025, 1, 8)]
        );
    }

    #[test]
    fn forward_then_backward_restores_anchor() {
        let spec = ScheduleSpec::interval(4, date(2024, 2, 29));
        let forward = spec.with_anchor(shift(&spec, true.into()).unwrap());
        let back = shift(&forward, false.into()).unwrap();
        assert_eq!(back, date(2024, 2, 29));
    }

    #[test]
    fn backward_crosses_month_boundary() {
        let spec = ScheduleSpec::interval(2, date(2025, 3, 1));
        assert_eq!(
            shift(&spec, ShiftDirection::Backward).unwrap(),
            date(2025, 2, 28)
        );
    }

    #[test]
    fn only_interval_schedules_shift() {
        for spec in [ScheduleSpec::none(), ScheduleSpec::weekly([1])] {
            let err = shift(&spec, ShiftDirection::Forward).unwrap_err();
            assert_eq!(
                err,
                ScheduleError::UnsupportedShiftOperation { kind: spec.kind }
            );
        }
    }

    #[test]
    fn invalid_interval_cannot_shift() {
        let spec = ScheduleSpec::interval(45, date(2025, 1, 1));
        assert!(matches!(
            shift(&spec, ShiftDirection::Forward),
            Err(ScheduleError::InvalidScheduleConfiguration { .. })
        ));
    }
}
