pub mod attendance;
pub mod auth;
pub mod gateway;
pub mod incidents;
pub mod reservations;

pub use attendance::HttpAttendanceService;
pub use auth::HttpAuthService;
pub use gateway::GatewayClient;
pub use incidents::HttpIncidentsService;
pub use reservations::HttpReservationsService;
