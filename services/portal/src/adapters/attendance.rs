//! services/portal/src/adapters/attendance.rs
//!
//! Adapter for the attendance service. Implements the `AttendanceService` port.

use async_trait::async_trait;
use campus_core::domain::{
    AttendanceLog, AttendanceRegistration, HistoryFilter, LoggedSchedule, SessionContext,
};
use campus_core::ports::{AttendanceService, PortError, PortResult};
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{de::IgnoredAny, Deserialize};

use super::gateway::{push_opt, GatewayClient, Listing, Query};

#[derive(Clone)]
pub struct HttpAttendanceService {
    gateway: GatewayClient,
}

impl HttpAttendanceService {
    pub fn new(gateway: GatewayClient) -> Self {
        Self { gateway }
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
struct LogRecord {
    #[serde(default)]
    id: Option<serde_json::Value>,
    timestamp: DateTime<Utc>,
    location_code: String,
    #[serde(default)]
    users: Option<LogUser>,
    #[serde(default)]
    locations: Option<LogLocation>,
}

#[derive(Deserialize)]
struct LogUser {
    #[serde(default)]
    full_name: Option<String>,
}

#[derive(Deserialize)]
struct LogLocation {
    #[serde(default)]
    class_start: Option<DateTime<Utc>>,
    #[serde(default)]
    class_end: Option<DateTime<Utc>>,
    #[serde(default)]
    grace_period: Option<i64>,
}

impl LogRecord {
    fn into_domain(self) -> PortResult<AttendanceLog> {
        let schedule = self
            .locations
            .map(|loc| {
                let grace_period_minutes = loc
                    .grace_period
                    .map(u32::try_from)
                    .transpose()
                    .map_err(|_| {
                        PortError::InvalidResponse(format!(
                            "attendance log at {}: negative grace_period",
                            self.location_code
                        ))
                    })?;
                Ok::<_, PortError>(LoggedSchedule {
                    class_start: loc.class_start,
                    class_end: loc.class_end,
                    grace_period_minutes,
                })
            })
            .transpose()?;

        Ok(AttendanceLog {
            id: self.id.map(|id| match id {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            }),
            timestamp: self.timestamp,
            location_code: self.location_code,
            student_name: self.users.and_then(|u| u.full_name),
            schedule,
        })
    }
}

fn logs_into_domain(records: Vec<LogRecord>) -> PortResult<Vec<AttendanceLog>> {
    records.into_iter().map(LogRecord::into_domain).collect()
}

//=========================================================================================
// `AttendanceService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AttendanceService for HttpAttendanceService {
    async fn register(
        &self,
        ctx: &SessionContext,
        registration: &AttendanceRegistration,
    ) -> PortResult<()> {
        let _: IgnoredAny = self
            .gateway
            .send_json(Method::POST, Some(&ctx.token), "/attendance/register", registration)
            .await?;
        Ok(())
    }

    async fn history(&self, ctx: &SessionContext, filter: &HistoryFilter) -> PortResult<Vec<AttendanceLog>> {
        let mut query = Query::new();
        push_opt(&mut query, "user_id", filter.user_id);
        push_opt(&mut query, "location_code", filter.location_code.as_deref());
        push_opt(&mut query, "start_date", filter.start_date.as_deref());
        push_opt(&mut query, "end_date", filter.end_date.as_deref());
        push_opt(&mut query, "limit", filter.limit);

        let listing: Listing<LogRecord> = self
            .gateway
            .get_json(Some(&ctx.token), "/attendance/history", &query)
            .await?;
        logs_into_domain(listing.into_vec())
    }

    async fn reports(&self, ctx: &SessionContext) -> PortResult<Vec<AttendanceLog>> {
        let listing: Listing<LogRecord> = self
            .gateway
            .get_json(Some(&ctx.token), "/attendance/reports", &Query::new())
            .await?;
        logs_into_domain(listing.into_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> PortResult<Vec<AttendanceLog>> {
        let listing: Listing<LogRecord> = serde_json::from_str(json).unwrap();
        logs_into_domain(listing.into_vec())
    }

    #[test]
    fn nested_user_and_location_are_flattened() {
        let logs = parse(
            r#"[{
                "id": 1,
                "timestamp": "2025-03-10T13:05:00Z",
                "location_code": "LAB-101",
                "users": {"full_name": "María García"},
                "locations": {"class_start": "2025-03-10T13:00:00Z", "grace_period": 15}
            }]"#,
        )
        .unwrap();
        let log = &logs[0];
        assert_eq!(log.id.as_deref(), Some("1"));
        assert_eq!(log.student_name.as_deref(), Some("María García"));
        let schedule = log.schedule.unwrap();
        assert!(schedule.class_start.is_some());
        assert_eq!(schedule.grace_period_minutes, Some(15));
    }

    #[test]
    fn logs_without_location_have_no_schedule() {
        let logs = parse(
            r#"{"items": [{
                "id": "a1",
                "timestamp": "2025-03-10T15:00:00Z",
                "location_code": "BIBLIOTECA",
                "locations": null
            }]}"#,
        )
        .unwrap();
        assert_eq!(logs[0].id.as_deref(), Some("a1"));
        assert!(logs[0].schedule.is_none());
        assert!(logs[0].student_name.is_none());
    }

    #[test]
    fn negative_grace_is_a_schema_violation() {
        let result = parse(
            r#"[{
                "timestamp": "2025-03-10T15:00:00Z",
                "location_code": "LAB-102",
                "locations": {"class_start": "2025-03-10T13:00:00Z", "grace_period": -1}
            }]"#,
        );
        assert!(matches!(result, Err(PortError::InvalidResponse(_))));
    }
}
