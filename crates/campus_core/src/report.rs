//! crates/campus_core/src/report.rs
//!
//! Builds the attendance report table and its summary figures from the logs
//! returned by the attendance service.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::attendance::classify_logged;
use crate::domain::{AttendanceLog, LoggedStatus, RecurringClassTime, Severity};

/// Location filter value that selects every location.
pub const ALL_LOCATIONS: &str = "TODOS";

pub const UNKNOWN_STUDENT: &str = "Usuario Desconocido";

/// One rendered row of the report table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub student: String,
    pub location_code: String,
    pub timestamp: DateTime<Utc>,
    pub date: String,
    pub time: String,
    #[serde(flatten)]
    pub status: LoggedStatus,
    pub label: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    pub total: usize,
    pub today: usize,
    pub punctuality: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceReport {
    pub rows: Vec<ReportRow>,
    pub stats: ReportStats,
    /// Values accepted by the location filter, `TODOS` first.
    pub locations: Vec<String>,
}

/// The daily class time of a log, if it carries a class start.
pub fn log_schedule(log: &AttendanceLog, campus_offset: FixedOffset) -> Option<RecurringClassTime> {
    let schedule = log.schedule.as_ref()?;
    let class_start = schedule.class_start?;
    Some(RecurringClassTime::from_stored_start(
        class_start,
        schedule.class_end,
        schedule.grace_period_minutes,
        campus_offset,
    ))
}

pub fn classify_log(log: &AttendanceLog, campus_offset: FixedOffset) -> LoggedStatus {
    let schedule = log_schedule(log, campus_offset);
    classify_logged(log.timestamp.with_timezone(&campus_offset), schedule.as_ref())
}

/// `TODOS` followed by every location code in first-seen order.
pub fn location_options(logs: &[AttendanceLog]) -> Vec<String> {
    let mut options = vec![ALL_LOCATIONS.to_string()];
    for log in logs {
        if !options.iter().any(|code| code == &log.location_code) {
            options.push(log.location_code.clone());
        }
    }
    options
}

pub fn build_report(
    logs: &[AttendanceLog],
    location_filter: Option<&str>,
    campus_offset: FixedOffset,
    now: DateTime<Utc>,
) -> AttendanceReport {
    let filter = location_filter.filter(|code| !code.is_empty() && *code != ALL_LOCATIONS);
    let today = now.with_timezone(&campus_offset).date_naive();

    let mut on_time = 0usize;
    let mut timed = 0usize;
    let mut today_count = 0usize;

    let rows: Vec<ReportRow> = logs
        .iter()
        .filter(|log| filter.map_or(true, |code| log.location_code == code))
        .map(|log| {
            let local = log.timestamp.with_timezone(&campus_offset);
            let status = classify_log(log, campus_offset);
            if status.is_timed() {
                timed += 1;
            }
            if status == LoggedStatus::OnTime {
                on_time += 1;
            }
            if local.date_naive() == today {
                today_count += 1;
            }
            ReportRow {
                student: log
                    .student_name
                    .clone()
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_STUDENT.to_string()),
                location_code: log.location_code.clone(),
                timestamp: log.timestamp,
                date: local.format("%d/%m/%Y").to_string(),
                time: local.format("%H:%M:%S").to_string(),
                label: status.label(),
                severity: status.severity(),
                status,
            }
        })
        .collect();

    let punctuality = if timed == 0 {
        "0%".to_string()
    } else {
        format!("{}%", (on_time * 100 + timed / 2) / timed)
    };

    AttendanceReport {
        stats: ReportStats {
            total: rows.len(),
            today: today_count,
            punctuality,
        },
        rows,
        locations: location_options(logs),
    }
}

/// Header line of the exported report.
pub const CSV_HEADER: &str = "Estudiante,Ubicación,Fecha,Hora,Estado";

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Renders report rows as CSV, one line per row, with the status label as `Estado`.
pub fn export_csv(rows: &[ReportRow]) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');
    for row in rows {
        let line = [
            row.student.as_str(),
            row.location_code.as_str(),
            row.date.as_str(),
            row.time.as_str(),
            row.label.as_str(),
        ]
        .map(csv_field)
        .join(",");
        csv.push_str(&line);
        csv.push('\n');
    }
    csv
}
