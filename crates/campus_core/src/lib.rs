pub mod attendance;
pub mod availability;
pub mod domain;
pub mod geo;
pub mod ports;
pub mod report;
pub mod validation;

pub use attendance::{classify_logged, classify_scan, device_position, GeofencedMatch, GeolocationFailure};
pub use domain::{
    AccessToken, AttendanceLog, AttendanceStatus, ClassLocation, Coordinates, LoggedStatus,
    RecurringClassTime, Role, ScanEvent, ScheduledSession, SessionContext, UserProfile,
};
pub use ports::{
    AttendanceService, AuthService, IncidentsService, PortError, PortResult, ReservationsService,
};
pub use validation::ValidationErrors;
