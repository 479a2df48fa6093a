use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ScheduleError;
use crate::schedule::{weekday_index, RoutineId, ScheduleKind, ScheduleSpec, Scheduled};

/// A day on which a routine is due. Derived on demand, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Occurrence {
    pub routine_id: RoutineId,
    pub routine_name: String,
    pub date: NaiveDate,
}

pub fn is_scheduled_for(spec: &ScheduleSpec, date: NaiveDate) -> Result<bool, ScheduleError> {
    spec.validate()?;
    fires_on(spec, date)
}

/// Earliest due day on or after `from`. Today counts when it is itself due.
pub fn next_occurrence(
    spec: &ScheduleSpec,
    from: NaiveDate,
) -> Result<Option<NaiveDate>, ScheduleError> {
    spec.validate()?;
    match spec.kind {
        ScheduleKind::None => Ok(None),
        ScheduleKind::Weekly => {
            for offset in 0..7 {
                let candidate = offset_days(from, offset)?;
                if spec.days.contains(&weekday_index(candidate)) {
                    return Ok(Some(candidate));
                }
            }
            Ok(None)
        }
        ScheduleKind::Interval => {
            let anchor = spec.require_anchor()?;
            if from < anchor {
                return Ok(Some(anchor));
            }
            let rem = days_between(anchor, from).rem_euclid(spec.interval_days);
            if rem == 0 {
                Ok(Some(from))
            } else {
                offset_days(from, spec.interval_days - rem).map(Some)
            }
        }
    }
}

/// Every due day in the half-open range `[start, end)`.
pub fn occurrences_between(
    spec: &ScheduleSpec,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<NaiveDate>, ScheduleError> {
    spec.validate()?;
    let mut dates = Vec::new();
    for day in start.iter_days().take_while(|day| *day < end) {
        if fires_on(spec, day)? {
            dates.push(day);
        }
    }
    Ok(dates)
}

/// Routines due on `date`, in input order.
///
/// A routine whose stored spec is malformed is skipped with a warning so one
/// bad record does not hide the rest.
pub fn due_on<'a, R, I>(routines: I, date: NaiveDate) -> Vec<Occurrence>
where
    R: Scheduled + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let mut due = Vec::new();
    for routine in routines {
        match is_scheduled_for(routine.schedule(), date) {
            Ok(true) => due.push(Occurrence {
                routine_id: routine.routine_id().clone(),
                routine_name: routine.routine_name().to_string(),
                date,
            }),
            Ok(false) => {}
            Err(err) => {
                warn!(routine = %routine.routine_id(), %err, "skipping routine with invalid schedule");
            }
        }
    }
    due
}

/// Evaluates an already validated spec against a single day.
pub(crate) fn fires_on(spec: &ScheduleSpec, date: NaiveDate) -> Result<bool, ScheduleError> {
    match spec.kind {
        ScheduleKind::None => Ok(false),
        ScheduleKind::Weekly => Ok(spec.days.contains(&weekday_index(date))),
        ScheduleKind::Interval => {
            let anchor = spec.require_anchor()?;
            if date < anchor {
                return Ok(false);
            }
            Ok(days_between(anchor, date).rem_euclid(spec.interval_days) == 0)
        }
    }
}

pub(crate) fn offset_days(date: NaiveDate, days: i64) -> Result<NaiveDate, ScheduleError> {
    date.checked_add_signed(Duration::days(days))
        .ok_or_else(|| ScheduleError::invalid(format!("{date} offset by {days} days is out of range")))
}

fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    later.signed_duration_since(earlier).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::RoutineSchedule;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2025-01-07 was a Tuesday.
    const MON: u8 = 1;
    const WED: u8 = 3;
    const FRI: u8 = 5;

    #[test]
    fn none_never_fires() {
        let spec = ScheduleSpec::none();
        assert!(!is_scheduled_for(&spec, date(2025, 1, 1)).unwrap());
        assert_eq!(next_occurrence(&spec, date(2025, 1, 1)).unwrap(), None);
    }

    #[test]
    fn push_day_weekly_schedule() {
        let spec = ScheduleSpec::weekly([MON, WED, FRI]);
        let tuesday = date(2025, 1, 7);
        let wednesday = date(2025, 1, 8);

        assert_eq!(next_occurrence(&spec, tuesday).unwrap(), Some(wednesday));
        assert!(is_scheduled_for(&spec, wednesday).unwrap());
        assert!(!is_scheduled_for(&spec, tuesday).unwrap());
    }

    #[test]
    fn weekly_matches_weekday_membership_over_four_weeks() {
        let spec = ScheduleSpec::weekly([0, 2, 6]);
        for day in date(2025, 3, 1).iter_days().take(28) {
            assert_eq!(
                is_scheduled_for(&spec, day).unwrap(),
                spec.days.contains(&weekday_index(day)),
                "mismatch on {day}"
            );
        }
    }

    #[test]
    fn weekly_next_occurrence_prefers_same_day_and_stays_within_a_week() {
        let monday = date(2025, 1, 6);
        let spec = ScheduleSpec::weekly([MON]);
        assert_eq!(next_occurrence(&spec, monday).unwrap(), Some(monday));

        for from in date(2025, 1, 1).iter_days().take(14) {
            let next = next_occurrence(&spec, from).unwrap().unwrap();
            assert!(next >= from);
            assert!(next <= from + Duration::days(6));
            assert_eq!(weekday_index(next), MON);
        }
    }

    #[test]
    fn leg_day_interval_schedule() {
        let spec = ScheduleSpec::interval(3, date(2025, 1, 1));
        assert!(is_scheduled_for(&spec, date(2025, 1, 4)).unwrap());
        assert!(!is_scheduled_for(&spec, date(2025, 1, 5)).unwrap());
        assert_eq!(
            next_occurrence(&spec, date(2025, 1, 5)).unwrap(),
            Some(date(2025, 1, 7))
        );
    }

    #[test]
    fn interval_fires_on_multiples_of_the_interval_only() {
        let anchor = date(2024, 12, 20);
        for interval in [1_i64, 2, 5, 7, 30] {
            let spec = ScheduleSpec::interval(interval, anchor);
            assert!(is_scheduled_for(&spec, anchor).unwrap());
            for k in 0..4 {
                let hit = anchor + Duration::days(k * interval);
                assert!(is_scheduled_for(&spec, hit).unwrap(), "{hit} should fire");
                for r in 1..interval {
                    let miss = hit + Duration::days(r);
                    assert!(!is_scheduled_for(&spec, miss).unwrap(), "{miss} should not fire");
                }
            }
        }
    }

    #[test]
    fn interval_before_anchor() {
        let anchor = date(2025, 2, 10);
        let spec = ScheduleSpec::interval(4, anchor);
        assert!(!is_scheduled_for(&spec, date(2025, 2, 6)).unwrap());
        assert_eq!(
            next_occurrence(&spec, date(2025, 1, 1)).unwrap(),
            Some(anchor)
        );
    }

    #[test]
    fn next_occurrence_is_never_before_from() {
        let specs = [
            ScheduleSpec::weekly([FRI]),
            ScheduleSpec::interval(6, date(2025, 1, 3)),
            ScheduleSpec::interval(30, date(2025, 2, 1)),
        ];
        for spec in &specs {
            for from in date(2025, 1, 1).iter_days().take(60) {
                let next = next_occurrence(spec, from).unwrap().unwrap();
                assert!(next >= from);
                assert!(is_scheduled_for(spec, next).unwrap());
            }
        }
    }

    #[test]
    fn zero_interval_is_rejected_instead_of_dividing() {
        let spec = ScheduleSpec::interval(0, date(2025, 1, 1));
        assert!(!spec.is_valid());
        assert!(matches!(
            is_scheduled_for(&spec, date(2025, 1, 2)),
            Err(ScheduleError::InvalidScheduleConfiguration { .. })
        ));
        assert!(matches!(
            next_occurrence(&spec, date(2025, 1, 2)),
            Err(ScheduleError::InvalidScheduleConfiguration { .. })
        ));
    }

    #[test]
    fn empty_weekly_is_rejected() {
        let spec = ScheduleSpec::weekly([]);
        assert!(next_occurrence(&spec, date(2025, 1, 2)).is_err());
    }

    #[test]
    fn lists_occurrences_in_half_open_range() {
        let spec = ScheduleSpec::interval(3, date(2025, 1, 1));
        let dates = occurrences_between(&spec, date(2025, 1, 1), date(2025, 1, 10)).unwrap();
        assert_eq!(
            dates,
            vec![date(2025, 1, 1), date(2025, 1, 4), date(2025, 1, 7)]
        );
        assert!(occurrences_between(&spec, date(2025, 1, 5), date(2025, 1, 5))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn due_on_skips_invalid_and_unscheduled_routines() {
        let monday = date(2025, 1, 6);
        let routines = vec![
            RoutineSchedule::new("push", "Push Day", ScheduleSpec::weekly([MON, WED, FRI])),
            RoutineSchedule::new("rest", "Rest", ScheduleSpec::none()),
            RoutineSchedule::new("broken", "Broken", ScheduleSpec::interval(0, monday)),
            RoutineSchedule::new("legs", "Leg Day", ScheduleSpec::interval(2, date(2025, 1, 2))),
        ];
        let due = due_on(&routines, monday);
        let ids: Vec<&str> = due.iter().map(|o| o.routine_id.as_str()).collect();
        assert_eq!(ids, vec!["push", "legs"]);
        assert!(due.iter().all(|o| o.date == monday));
    }
}
