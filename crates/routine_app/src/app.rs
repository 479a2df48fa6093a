use std::collections::HashSet;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveTime};
use routine_core::{describe_schedule, next_occurrence, RoutineId, SchedulingConfig};
use routine_domain::{JsonRoutineStore, RoutineService};
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) store_path: PathBuf,
    pub(crate) today: Option<NaiveDate>,
    pub(crate) scheduling: SchedulingConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_lookup(|key| std::env::var(key).ok()))
    }

    /// Builds the config from any key/value source. Values that fail to parse
    /// keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup("ROUTINE_STORE") {
            info!(path = %path, "using routine store");
            config.store_path = PathBuf::from(path);
        }
        if let Some(today) = lookup("ROUTINE_TODAY") {
            match NaiveDate::parse_from_str(today.trim(), "%Y-%m-%d") {
                Ok(date) => config.today = Some(date),
                Err(err) => warn!(value = %today, %err, "ignoring ROUTINE_TODAY"),
            }
        }
        if let Some(horizon) = lookup("ROUTINE_CONFLICT_HORIZON_DAYS") {
            match horizon.trim().parse::<u32>() {
                Ok(value) if value > 0 => config.scheduling.conflict_horizon_days = value,
                _ => warn!(value = %horizon, "ignoring ROUTINE_CONFLICT_HORIZON_DAYS"),
            }
        }
        if let Some(span) = lookup("ROUTINE_AGENDA_SPAN_DAYS") {
            match span.trim().parse::<u32>() {
                Ok(value) if value > 0 => config.scheduling.agenda_span_days = value,
                _ => warn!(value = %span, "ignoring ROUTINE_AGENDA_SPAN_DAYS"),
            }
        }
        if let Some(time) = lookup("ROUTINE_REMINDER_TIME") {
            match NaiveTime::parse_from_str(time.trim(), "%H:%M") {
                Ok(value) => config.scheduling.reminder_time = value,
                Err(err) => warn!(value = %time, %err, "ignoring ROUTINE_REMINDER_TIME"),
            }
        }
        config
    }

    /// The injected "today"; falls back to the local calendar day.
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("routines.json"),
            today: None,
            scheduling: SchedulingConfig::default(),
        }
    }
}

pub fn run(config: AppConfig) -> Result<()> {
    let store = JsonRoutineStore::new(&config.store_path);
    let location = store.path().display().to_string();
    info!(path = %location, "opening routine store");
    let service = RoutineService::builder()
        .with_store(Box::new(store))
        .with_config(config.scheduling)
        .build()
        .with_context(|| format!("opening routines at {location}"))?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_report(&service, config.today(), &mut out)
}

pub fn render_report(service: &RoutineService, today: NaiveDate, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", format_day_heading(today, today))?;
    let due = service.due_on(today);
    if due.is_empty() {
        writeln!(out, "  Rest day")?;
    }
    for occurrence in &due {
        writeln!(out, "  Due: {}", occurrence.routine_name)?;
    }

    writeln!(out)?;
    writeln!(out, "Upcoming")?;
    let span = service.config().agenda_span_days;
    for day in service.agenda(today, span).into_iter().skip(1) {
        if day.entries.is_empty() {
            continue;
        }
        let names: Vec<&str> = day
            .entries
            .iter()
            .map(|entry| entry.routine_name.as_str())
            .collect();
        writeln!(out, "  {}: {}", format_day_heading(day.date, today), names.join(", "))?;
    }

    writeln!(out)?;
    writeln!(out, "Routines")?;
    let routines = service.routines();
    for routine in &routines {
        let next = match next_occurrence(&routine.schedule, today) {
            Ok(Some(date)) => format_relative_label(date, today),
            Ok(None) => "-".to_string(),
            Err(err) => format!("invalid schedule ({err})"),
        };
        writeln!(
            out,
            "  {} · {} · next: {}",
            routine.name,
            describe_schedule(&routine.schedule),
            next
        )?;
    }

    let mut seen: HashSet<(RoutineId, RoutineId)> = HashSet::new();
    let mut overlaps = Vec::new();
    for routine in &routines {
        let Ok(conflicts) = service.check_conflicts(&routine.schedule, Some(&routine.id), today)
        else {
            continue;
        };
        for conflict in conflicts {
            let pair = if routine.id <= conflict.routine_id {
                (routine.id.clone(), conflict.routine_id.clone())
            } else {
                (conflict.routine_id.clone(), routine.id.clone())
            };
            if seen.insert(pair) {
                overlaps.push(format!(
                    "  {} overlaps with {} on {}",
                    routine.name,
                    conflict.routine_name,
                    conflict.date.format("%a %Y-%m-%d")
                ));
            }
        }
    }
    if !overlaps.is_empty() {
        writeln!(out)?;
        writeln!(out, "Overlaps")?;
        for line in overlaps {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

fn format_day_heading(date: NaiveDate, today: NaiveDate) -> String {
    let calendar = date.format("%A, %B %d, %Y");
    let relative = format_relative_label(date, today);
    format!("{} - {}", relative, calendar)
}

fn format_relative_label(date: NaiveDate, today: NaiveDate) -> String {
    let diff = date.signed_duration_since(today).num_days();
    match diff {
        -1 => "Yesterday".to_string(),
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        d if d < 0 => format!("{} days ago", -d),
        d => format!("In {} days", d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routine_core::ScheduleSpec;
    use routine_domain::{MemoryRoutineStore, Routine};
    use std::collections::HashMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ROUTINE_STORE", "/tmp/gym.json"),
            ("ROUTINE_TODAY", "2025-01-07"),
            ("ROUTINE_CONFLICT_HORIZON_DAYS", "0"),
            ("ROUTINE_AGENDA_SPAN_DAYS", "14"),
            ("ROUTINE_REMINDER_TIME", "late"),
        ]);
        let config = AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.store_path, PathBuf::from("/tmp/gym.json"));
        assert_eq!(config.today(), date(2025, 1, 7));
        assert_eq!(config.scheduling.conflict_horizon_days, 60);
        assert_eq!(config.scheduling.agenda_span_days, 14);
        assert_eq!(
            config.scheduling.reminder_time,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
    }

    #[test]
    fn run_reports_store_path_on_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "[{").expect("write fixture");

        let config = AppConfig {
            store_path: path.clone(),
            today: Some(date(2025, 1, 7)),
            scheduling: SchedulingConfig::default(),
        };
        let err = run(config).unwrap_err();
        assert!(format!("{err:#}").contains(&path.display().to_string()));
    }

    #[test]
    fn relative_labels() {
        let today = date(2025, 1, 7);
        assert_eq!(format_relative_label(today, today), "Today");
        assert_eq!(format_relative_label(date(2025, 1, 8), today), "Tomorrow");
        assert_eq!(format_relative_label(date(2025, 1, 10), today), "In 3 days");
        assert_eq!(format_relative_label(date(2025, 1, 4), today), "3 days ago");
    }

    #[test]
    fn report_lists_due_routines_and_overlaps_once() {
        let store = MemoryRoutineStore::with_routines([
            Routine::new("upper", "Upper", ScheduleSpec::weekly([1])),
            Routine::new("lower", "Lower", ScheduleSpec::weekly([1])),
            Routine::new("yoga", "Yoga", ScheduleSpec::none()),
        ]);
        let service = RoutineService::builder()
            .with_store(Box::new(store))
            .build()
            .expect("service");

        let mut buffer = Vec::new();
        // Tuesday, so both Monday routines are six days out.
        render_report(&service, date(2025, 1, 7), &mut buffer).expect("render");
        let text = String::from_utf8(buffer).expect("utf8");

        assert!(text.contains("Rest day"));
        assert!(text.contains("In 6 days - Monday, January 13, 2025: Lower, Upper"));
        assert!(text.contains("Yoga · Not scheduled · next: -"));
        assert!(text.contains("Upper · Every Mon · next: In 6 days"));
        assert_eq!(text.matches("overlaps with").count(), 1);
        assert!(text.contains("Lower overlaps with Upper on Mon 2025-01-13"));
    }
}
