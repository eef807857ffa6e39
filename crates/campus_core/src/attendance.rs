//! crates/campus_core/src/attendance.rs
//!
//! Attendance status classification.
//!
//! Two call sites exist. Live scans are classified against the exact dated
//! session of the scanned location and are geofenced. Historical logs only
//! carry the class start as a daily time, so they are classified against that
//! time placed on the calendar date of the scan.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AttendanceStatus, ClassLocation, Coordinates, LoggedStatus, RecurringClassTime, ScanEvent,
    ALLOWED_RADIUS_METERS,
};
use crate::geo::distance_meters;

/// Why the device position could not be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum GeolocationFailure {
    #[error("Permiso de ubicación denegado")]
    PermissionDenied,
    #[error("Ubicación no disponible")]
    PositionUnavailable,
    #[error("Tiempo de espera agotado")]
    Timeout,
    #[error("Geolocalización no soportada")]
    Unsupported,
}

/// Resolves what the browser reported about the device position.
///
/// A failure reported by the browser wins over any coordinates sent alongside it.
/// Missing or out-of-range coordinates count as an unavailable position.
pub fn device_position(
    latitude: Option<f64>,
    longitude: Option<f64>,
    reported_failure: Option<GeolocationFailure>,
) -> Result<Coordinates, GeolocationFailure> {
    if let Some(failure) = reported_failure {
        return Err(failure);
    }
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => {
            Coordinates::new(lat, lon).ok_or(GeolocationFailure::PositionUnavailable)
        }
        _ => Err(GeolocationFailure::PositionUnavailable),
    }
}

/// A scanned location together with how far the device was from it.
#[derive(Debug, Clone, Copy)]
pub struct GeofencedMatch<'a> {
    pub location: &'a ClassLocation,
    pub distance_meters: f64,
}

/// Classifies a live scan.
///
/// `matched` is `None` when the scanned code did not resolve to a location.
pub fn classify_scan(scanned_at: DateTime<Utc>, matched: Option<GeofencedMatch<'_>>) -> AttendanceStatus {
    let Some(GeofencedMatch {
        location,
        distance_meters,
    }) = matched
    else {
        return AttendanceStatus::Expired;
    };

    if !location.is_valid_at(scanned_at) {
        return AttendanceStatus::Expired;
    }
    if distance_meters > ALLOWED_RADIUS_METERS {
        return AttendanceStatus::InvalidLocation { distance_meters };
    }

    match time_window(
        scanned_at,
        location.session.starts_at,
        location.grace_period(),
        Some(location.session.ends_at),
    ) {
        Window::OnTime => AttendanceStatus::OnTime,
        Window::Late(delay_minutes) => AttendanceStatus::Late { delay_minutes },
        Window::Absent => AttendanceStatus::Absent,
    }
}

/// Classifies a historical log entry.
///
/// `scanned_at` must already be expressed in the campus offset, since the
/// calendar date of the scan decides which day the class start lands on.
pub fn classify_logged(
    scanned_at: DateTime<FixedOffset>,
    schedule: Option<&RecurringClassTime>,
) -> LoggedStatus {
    let Some(schedule) = schedule else {
        return LoggedStatus::Registered;
    };

    let Some(start) = scanned_at
        .date_naive()
        .and_time(schedule.start)
        .and_local_timezone(*scanned_at.offset())
        .single()
    else {
        return LoggedStatus::Registered;
    };

    match time_window(
        scanned_at.with_timezone(&Utc),
        start.with_timezone(&Utc),
        schedule.grace_period(),
        None,
    ) {
        Window::OnTime => LoggedStatus::OnTime,
        Window::Late(delay_minutes) => LoggedStatus::Late { delay_minutes },
        Window::Absent => LoggedStatus::Absent,
    }
}

impl ScanEvent {
    /// Distance between the device and the matched location, when both are known.
    pub fn distance_meters(&self) -> Option<f64> {
        let position = self.position?;
        let location = self.matched_location.as_ref()?;
        Some(distance_meters(position, location.coordinates))
    }

    /// Classifies this scan. A scan without a device position cannot be
    /// geofenced and is reported as a location failure instead of a status.
    pub fn classify(&self) -> Result<AttendanceStatus, GeolocationFailure> {
        if self.position.is_none() {
            return Err(GeolocationFailure::PositionUnavailable);
        }
        let matched = self
            .matched_location
            .as_ref()
            .zip(self.distance_meters())
            .map(|(location, distance_meters)| GeofencedMatch {
                location,
                distance_meters,
            });
        Ok(classify_scan(self.timestamp, matched))
    }
}

enum Window {
    OnTime,
    Late(i64),
    Absent,
}

// Boundaries resolve to the more favorable bucket.
fn time_window(
    at: DateTime<Utc>,
    start: DateTime<Utc>,
    grace: Duration,
    end: Option<DateTime<Utc>>,
) -> Window {
    if at <= start {
        Window::OnTime
    } else if end.is_some_and(|end| at > end) {
        Window::Absent
    } else if at <= start + grace {
        Window::Late(delay_minutes(at - start))
    } else {
        Window::Absent
    }
}

/// Whole minutes of delay, rounded to nearest and never below one.
fn delay_minutes(elapsed: Duration) -> i64 {
    let millis = elapsed.num_milliseconds();
    ((millis + 30_000) / 60_000).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScheduledSession;
    use chrono::{NaiveTime, TimeZone};
    use uuid::Uuid;

    fn utc(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, s).unwrap()
    }

    fn location(grace: Option<u32>) -> ClassLocation {
        ClassLocation {
            id: Uuid::new_v4(),
            location_code: "LAB-101".to_string(),
            name: Some("Laboratorio 101".to_string()),
            coordinates: Coordinates::new(-12.0464, -77.0428).unwrap(),
            session: ScheduledSession {
                starts_at: utc(8, 0, 0),
                ends_at: utc(10, 0, 0),
            },
            grace_period_minutes: grace,
            is_active: true,
            valid_until: None,
        }
    }

    fn near(location: &ClassLocation) -> Option<GeofencedMatch<'_>> {
        Some(GeofencedMatch {
            location,
            distance_meters: 12.0,
        })
    }

    fn recurring(h: u32, m: u32, grace: Option<u32>) -> RecurringClassTime {
        RecurringClassTime {
            start: NaiveTime::from_hms_opt(h, m, 0).unwrap(),
            end: None,
            grace_period_minutes: grace,
        }
    }

    fn local(h: u32, m: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 10, h, m, s)
            .unwrap()
    }

    #[test]
    fn scan_at_class_start_is_on_time() {
        let loc = location(Some(15));
        assert_eq!(classify_scan(utc(8, 0, 0), near(&loc)), AttendanceStatus::OnTime);
        assert_eq!(classify_scan(utc(7, 45, 0), near(&loc)), AttendanceStatus::OnTime);
    }

    #[test]
    fn scan_inside_grace_period_is_late_with_delay() {
        let loc = location(Some(15));
        assert_eq!(
            classify_scan(utc(8, 10, 0), near(&loc)),
            AttendanceStatus::Late { delay_minutes: 10 }
        );
        assert_eq!(
            classify_scan(utc(8, 15, 0), near(&loc)),
            AttendanceStatus::Late { delay_minutes: 15 }
        );
    }

    #[test]
    fn scan_after_grace_period_is_absent() {
        let loc = location(Some(15));
        assert_eq!(classify_scan(utc(8, 20, 0), near(&loc)), AttendanceStatus::Absent);
    }

    #[test]
    fn scan_after_class_end_is_absent_even_inside_grace() {
        let mut loc = location(Some(90));
        loc.session.ends_at = utc(8, 30, 0);
        assert_eq!(
            classify_scan(utc(8, 30, 0), near(&loc)),
            AttendanceStatus::Late { delay_minutes: 30 }
        );
        assert_eq!(classify_scan(utc(8, 31, 0), near(&loc)), AttendanceStatus::Absent);
    }

    #[test]
    fn far_scans_are_invalid_location_regardless_of_time() {
        let loc = location(Some(15));
        let far = Some(GeofencedMatch {
            location: &loc,
            distance_meters: 150.0,
        });
        assert_eq!(
            classify_scan(utc(7, 59, 0), far),
            AttendanceStatus::InvalidLocation {
                distance_meters: 150.0
            }
        );
    }

    #[test]
    fn exactly_at_radius_is_accepted() {
        let loc = location(Some(15));
        let edge = Some(GeofencedMatch {
            location: &loc,
            distance_meters: ALLOWED_RADIUS_METERS,
        });
        assert_eq!(classify_scan(utc(7, 59, 0), edge), AttendanceStatus::OnTime);
    }

    #[test]
    fn unresolved_or_expired_codes_are_expired() {
        assert_eq!(classify_scan(utc(8, 0, 0), None), AttendanceStatus::Expired);

        let mut inactive = location(Some(15));
        inactive.is_active = false;
        assert_eq!(classify_scan(utc(8, 0, 0), near(&inactive)), AttendanceStatus::Expired);

        let mut lapsed = location(Some(15));
        lapsed.valid_until = Some(utc(7, 0, 0));
        assert_eq!(classify_scan(utc(8, 0, 0), near(&lapsed)), AttendanceStatus::Expired);
    }

    #[test]
    fn missing_grace_defaults_to_fifteen_minutes() {
        let mut loc = location(None);
        loc.session.starts_at = utc(9, 0, 0);
        loc.session.ends_at = utc(11, 0, 0);
        assert_eq!(
            classify_scan(utc(9, 14, 59), near(&loc)),
            AttendanceStatus::Late { delay_minutes: 15 }
        );
        assert_eq!(classify_scan(utc(9, 15, 1), near(&loc)), AttendanceStatus::Absent);
    }

    #[test]
    fn a_few_seconds_late_still_reports_one_minute() {
        let loc = location(Some(15));
        assert_eq!(
            classify_scan(utc(8, 0, 10), near(&loc)),
            AttendanceStatus::Late { delay_minutes: 1 }
        );
    }

    #[test]
    fn scan_event_without_position_is_a_location_failure() {
        let event = ScanEvent {
            timestamp: utc(7, 59, 0),
            position: None,
            matched_location: Some(location(Some(15))),
        };
        assert_eq!(event.classify(), Err(GeolocationFailure::PositionUnavailable));
    }

    #[test]
    fn scan_event_measures_distance_to_the_location() {
        let loc = location(Some(15));
        let nearby = ScanEvent {
            timestamp: utc(8, 5, 0),
            position: Coordinates::new(-12.0465, -77.0428),
            matched_location: Some(loc.clone()),
        };
        assert_eq!(nearby.classify(), Ok(AttendanceStatus::Late { delay_minutes: 5 }));

        let across_town = ScanEvent {
            timestamp: utc(8, 5, 0),
            position: Coordinates::new(-12.1000, -77.0428),
            matched_location: Some(loc),
        };
        assert!(matches!(
            across_town.classify(),
            Ok(AttendanceStatus::InvalidLocation { distance_meters }) if distance_meters > 5_000.0
        ));
    }

    #[test]
    fn logged_scans_follow_the_daily_class_time() {
        let schedule = recurring(8, 0, Some(15));
        assert_eq!(classify_logged(local(8, 0, 0), Some(&schedule)), LoggedStatus::OnTime);
        assert_eq!(
            classify_logged(local(8, 10, 0), Some(&schedule)),
            LoggedStatus::Late { delay_minutes: 10 }
        );
        assert_eq!(classify_logged(local(8, 20, 0), Some(&schedule)), LoggedStatus::Absent);
    }

    #[test]
    fn logged_scan_exactly_at_the_grace_limit_is_late() {
        let schedule = recurring(8, 0, Some(15));
        assert_eq!(
            classify_logged(local(8, 15, 0), Some(&schedule)),
            LoggedStatus::Late { delay_minutes: 15 }
        );
        assert_eq!(classify_logged(local(8, 15, 1), Some(&schedule)), LoggedStatus::Absent);
    }

    #[test]
    fn logged_scans_ignore_the_stored_class_date() {
        // Stored start sits on an epoch placeholder date; only its time matters.
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let stored = Utc.with_ymd_and_hms(1970, 1, 1, 13, 0, 0).unwrap();
        let schedule = RecurringClassTime::from_stored_start(stored, None, None, offset);
        assert_eq!(schedule.start, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(classify_logged(local(7, 55, 0), Some(&schedule)), LoggedStatus::OnTime);
        assert_eq!(classify_logged(local(8, 16, 0), Some(&schedule)), LoggedStatus::Absent);
    }

    #[test]
    fn logs_without_schedule_are_only_registered() {
        assert_eq!(classify_logged(local(3, 0, 0), None), LoggedStatus::Registered);
    }

    #[test]
    fn logged_grace_defaults_to_fifteen_minutes() {
        let schedule = recurring(9, 0, None);
        assert_eq!(
            classify_logged(local(9, 14, 59), Some(&schedule)),
            LoggedStatus::Late { delay_minutes: 15 }
        );
        assert_eq!(classify_logged(local(9, 15, 1), Some(&schedule)), LoggedStatus::Absent);
    }

    #[test]
    fn browser_failures_win_over_coordinates() {
        assert_eq!(
            device_position(Some(1.0), Some(1.0), Some(GeolocationFailure::Timeout)),
            Err(GeolocationFailure::Timeout)
        );
        assert_eq!(
            device_position(None, Some(1.0), None),
            Err(GeolocationFailure::PositionUnavailable)
        );
        assert_eq!(
            device_position(Some(95.0), Some(1.0), None),
            Err(GeolocationFailure::PositionUnavailable)
        );
        assert!(device_position(Some(-12.0), Some(-77.0), None).is_ok());
    }
}
