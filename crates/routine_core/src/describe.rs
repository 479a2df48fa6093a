use crate::schedule::{ScheduleKind, ScheduleSpec};

const WEEKDAY_ABBREVIATIONS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Short human readable summary used for badges and previews.
///
/// Malformed specs get a label of their own instead of a summary that
/// silently drops the bad fields.
pub fn describe_schedule(spec: &ScheduleSpec) -> String {
    match spec.kind {
        ScheduleKind::None => "Not scheduled".to_string(),
        ScheduleKind::Weekly if spec.days.is_empty() => "No days selected".to_string(),
        _ if !spec.is_valid() => "Invalid schedule".to_string(),
        ScheduleKind::Weekly => {
            let names: Vec<&str> = spec
                .days
                .iter()
                .filter_map(|day| WEEKDAY_ABBREVIATIONS.get(usize::from(*day)).copied())
                .collect();
            if names.len() == WEEKDAY_ABBREVIATIONS.len() {
                "Every day".to_string()
            } else {
                format!("Every {}", names.join(", "))
            }
        }
        ScheduleKind::Interval => match spec.interval_days {
            1 => "Every day".to_string(),
            n => format!("Every {n} days"),
        },
    }
}
