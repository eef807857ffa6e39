//! crates/campus_core/src/domain.rs
//!
//! Defines the core data structures shared by the portal and its service ports.
//! Wire formats of the individual gateway services are handled by the adapters;
//! these types are what the rest of the application works with.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Radius around a class location inside which a scan counts as present.
pub const ALLOWED_RADIUS_METERS: f64 = 100.0;

/// Grace period applied when a location does not configure one.
pub const DEFAULT_GRACE_PERIOD_MINUTES: u32 = 15;

//=========================================================================================
// Users and Sessions
//=========================================================================================

/// The role a user holds in the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
    /// Any role string the auth service returns that the portal does not know.
    /// Grants no privileges.
    #[serde(untagged)]
    Other(String),
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Admins and teachers may generate location QR codes.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Teacher)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Other(s) => s,
        }
    }
}

/// A user as returned by the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// An opaque bearer token issued by the auth service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens never end up in logs.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// The credentials of one logged-in user, passed explicitly to every port call
/// that needs them.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub token: AccessToken,
    pub user: UserProfile,
}

impl SessionContext {
    pub fn new(token: AccessToken, user: UserProfile) -> Self {
        Self { token, user }
    }
}

/// The result of a successful login against the auth service.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    pub token: AccessToken,
    pub user: UserProfile,
}

//=========================================================================================
// Geography
//=========================================================================================

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Returns `None` when either component is out of range or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self { latitude, longitude })
    }
}

//=========================================================================================
// Class Schedules
//=========================================================================================

/// One dated class session with exact bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledSession {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// A class that repeats every day at the same local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurringClassTime {
    pub start: NaiveTime,
    pub end: Option<NaiveTime>,
    pub grace_period_minutes: Option<u32>,
}

impl RecurringClassTime {
    /// Builds a recurring time from a stored `class_start` instant, keeping only
    /// its time of day as seen from the campus offset.
    pub fn from_stored_start(
        class_start: DateTime<Utc>,
        class_end: Option<DateTime<Utc>>,
        grace_period_minutes: Option<u32>,
        campus_offset: FixedOffset,
    ) -> Self {
        Self {
            start: class_start.with_timezone(&campus_offset).time(),
            end: class_end.map(|end| end.with_timezone(&campus_offset).time()),
            grace_period_minutes,
        }
    }

    pub fn grace_period(&self) -> Duration {
        grace_duration(self.grace_period_minutes)
    }
}

pub(crate) fn grace_duration(minutes: Option<u32>) -> Duration {
    Duration::minutes(i64::from(minutes.unwrap_or(DEFAULT_GRACE_PERIOD_MINUTES)))
}

//=========================================================================================
// Attendance
//=========================================================================================

/// A schedulable physical location tied to one class session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassLocation {
    pub id: Uuid,
    pub location_code: String,
    pub name: Option<String>,
    pub coordinates: Coordinates,
    pub session: ScheduledSession,
    pub grace_period_minutes: Option<u32>,
    pub is_active: bool,
    pub valid_until: Option<DateTime<Utc>>,
}

impl ClassLocation {
    /// Whether the location still accepts scans at `at`.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.is_active && self.valid_until.map_or(true, |until| at <= until)
    }

    pub fn grace_period(&self) -> Duration {
        grace_duration(self.grace_period_minutes)
    }
}

/// Visual weight of a status, used by the browser to pick a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Danger,
    Muted,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
            Severity::Muted => "muted",
        }
    }
}

/// Outcome of classifying one scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    OnTime,
    Late { delay_minutes: i64 },
    Absent,
    InvalidLocation { distance_meters: f64 },
    Expired,
}

impl AttendanceStatus {
    pub fn code(&self) -> &'static str {
        match self {
            AttendanceStatus::OnTime => "ON_TIME",
            AttendanceStatus::Late { .. } => "LATE",
            AttendanceStatus::Absent => "ABSENT",
            AttendanceStatus::InvalidLocation { .. } => "INVALID_LOCATION",
            AttendanceStatus::Expired => "EXPIRED",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::OnTime => "A tiempo",
            AttendanceStatus::Late { .. } => "Retraso",
            AttendanceStatus::Absent => "Falta",
            AttendanceStatus::InvalidLocation { .. } => "Ubicación inválida",
            AttendanceStatus::Expired => "QR expirado",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AttendanceStatus::OnTime => Severity::Success,
            AttendanceStatus::Late { .. } => Severity::Warning,
            AttendanceStatus::Absent | AttendanceStatus::InvalidLocation { .. } => {
                Severity::Danger
            }
            AttendanceStatus::Expired => Severity::Muted,
        }
    }
}

/// Outcome of classifying a historical log entry. Logs without schedule data
/// are only marked as registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoggedStatus {
    Registered,
    OnTime,
    Late { delay_minutes: i64 },
    Absent,
}

impl LoggedStatus {
    pub fn label(&self) -> String {
        match self {
            LoggedStatus::Registered => "Registrado".to_string(),
            LoggedStatus::OnTime => "Puntual".to_string(),
            LoggedStatus::Late { delay_minutes } => format!("Retraso ({delay_minutes} min)"),
            LoggedStatus::Absent => "Ausente".to_string(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            LoggedStatus::Registered => Severity::Muted,
            LoggedStatus::OnTime => Severity::Success,
            LoggedStatus::Late { .. } => Severity::Warning,
            LoggedStatus::Absent => Severity::Danger,
        }
    }

    pub fn is_timed(&self) -> bool {
        !matches!(self, LoggedStatus::Registered)
    }
}

/// One attendance-producing action, captured when the browser decodes a QR
/// code and obtains the device position.
#[derive(Debug, Clone)]
pub struct ScanEvent {
    pub timestamp: DateTime<Utc>,
    pub position: Option<Coordinates>,
    pub matched_location: Option<ClassLocation>,
}

/// An attendance log entry as stored by the attendance service.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceLog {
    pub id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub location_code: String,
    pub student_name: Option<String>,
    pub schedule: Option<LoggedSchedule>,
}

/// Schedule data attached to a log entry, still in stored form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggedSchedule {
    pub class_start: Option<DateTime<Utc>>,
    pub class_end: Option<DateTime<Utc>>,
    pub grace_period_minutes: Option<u32>,
}

/// The check-in sent to the attendance service after a live scan.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRegistration {
    pub user_id: Uuid,
    pub location_id: Uuid,
    pub location_code: String,
    pub timestamp: DateTime<Utc>,
    pub status: &'static str,
    pub delay_minutes: Option<i64>,
    pub distance_meters: Option<f64>,
    pub user_latitude: f64,
    pub user_longitude: f64,
}

/// Query filters for the attendance history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryFilter {
    pub user_id: Option<Uuid>,
    pub location_code: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<u32>,
}

/// What the auth service answers to a plain code scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessReceipt {
    pub location_code: String,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One access recorded by the auth service's QR endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRecord {
    pub id: String,
    pub user_id: Uuid,
    #[serde(default)]
    pub location_id: Option<Uuid>,
    pub location_code: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<String>,
}

//=========================================================================================
// Administration
//=========================================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub active_users: u64,
    #[serde(default)]
    pub total_locations: u64,
    #[serde(default)]
    pub scans_today: u64,
}

/// A location to be created together with its QR code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLocation {
    pub location_code: String,
    #[serde(default)]
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub class_start: DateTime<Utc>,
    pub class_end: DateTime<Utc>,
    #[serde(default = "default_grace")]
    pub grace_period: u32,
}

fn default_grace() -> u32 {
    DEFAULT_GRACE_PERIOD_MINUTES
}

//=========================================================================================
// Reservations
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub nombre: String,
    pub tipo: String,
    pub estado: String,
    #[serde(default)]
    pub capacidad: Option<u32>,
    #[serde(default)]
    pub ubicacion: Option<String>,
    #[serde(default)]
    pub horario_inicio: Option<String>,
    #[serde(default)]
    pub horario_fin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceKind {
    pub tipo: String,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub disponibles: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceFilter {
    pub tipo: Option<String>,
    pub estado: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub inicio: String,
    pub fin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    pub recurso_id: String,
    pub fecha: String,
    #[serde(default)]
    pub horarios_ocupados: Vec<TimeSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReservation {
    pub recurso_id: String,
    pub fecha: String,
    pub hora_inicio: String,
    pub hora_fin: String,
    pub usuario_id: Uuid,
    pub usuario_nombre: String,
    pub usuario_email: String,
    #[serde(default)]
    pub motivo: Option<String>,
    pub num_asistentes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub recurso_id: String,
    pub fecha: String,
    pub hora_inicio: String,
    pub hora_fin: String,
    pub estado: String,
    #[serde(default)]
    pub motivo: Option<String>,
    #[serde(default)]
    pub num_asistentes: Option<u32>,
    #[serde(default)]
    pub recurso_nombre: Option<String>,
}

//=========================================================================================
// Incidents
//=========================================================================================

/// The catalogs exposed by the incidents service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Estados,
    Prioridades,
    Categorias,
    Ubicaciones,
}

impl CatalogKind {
    pub fn as_path(&self) -> &'static str {
        match self {
            CatalogKind::Estados => "estados",
            CatalogKind::Prioridades => "prioridades",
            CatalogKind::Categorias => "categorias",
            CatalogKind::Ubicaciones => "ubicaciones",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub codigo: String,
    pub nombre: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub titulo: String,
    pub descripcion: String,
    pub estado_codigo: String,
    pub prioridad_codigo: String,
    #[serde(default)]
    pub categoria_codigo: Option<String>,
    #[serde(default)]
    pub ubicacion_codigo: Option<String>,
    #[serde(default)]
    pub responsable_id: Option<String>,
    #[serde(default)]
    pub creado_en: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actualizado_en: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketFilter {
    pub estado_codigo: Option<String>,
    pub prioridad_codigo: Option<String>,
    pub categoria_codigo: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    pub titulo: String,
    pub descripcion: String,
    pub prioridad_codigo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categoria_codigo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ubicacion_codigo: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prioridad_codigo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub estado_codigo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comentario: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub responsable_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comentario: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub accion: String,
    #[serde(default)]
    pub detalle: Option<String>,
    #[serde(default)]
    pub usuario_id: Option<String>,
    pub fecha: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub contenido: String,
    #[serde(default)]
    pub es_interno: bool,
    #[serde(default)]
    pub autor_id: Option<String>,
    pub fecha: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub contenido: String,
    #[serde(default)]
    pub es_interno: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_roles_grant_nothing() {
        let role: Role = serde_json::from_str("\"janitor\"").unwrap();
        assert_eq!(role, Role::Other("janitor".to_string()));
        assert!(!role.is_admin());
        assert!(!role.is_staff());

        let teacher: Role = serde_json::from_str("\"teacher\"").unwrap();
        assert!(teacher.is_staff());
        assert!(!teacher.is_admin());
    }

    #[test]
    fn coordinates_reject_out_of_range_values() {
        assert!(Coordinates::new(-12.05, -77.04).is_some());
        assert!(Coordinates::new(91.0, 0.0).is_none());
        assert!(Coordinates::new(0.0, -180.5).is_none());
        assert!(Coordinates::new(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn status_serializes_with_upper_snake_codes() {
        let json = serde_json::to_value(AttendanceStatus::Late { delay_minutes: 4 }).unwrap();
        assert_eq!(json["status"], "LATE");
        assert_eq!(json["delay_minutes"], 4);

        let json = serde_json::to_value(AttendanceStatus::InvalidLocation {
            distance_meters: 150.0,
        })
        .unwrap();
        assert_eq!(json["status"], "INVALID_LOCATION");
    }

    #[test]
    fn access_token_debug_is_redacted() {
        let token = AccessToken::new("secret-value");
        assert!(!format!("{token:?}").contains("secret"));
    }
}
