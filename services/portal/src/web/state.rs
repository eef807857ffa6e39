//! services/portal/src/web/state.rs
//!
//! Defines the application state shared by every request.

use crate::config::Config;
use campus_core::ports::{AttendanceService, AuthService, IncidentsService, ReservationsService};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<dyn AuthService>,
    pub attendance: Arc<dyn AttendanceService>,
    pub reservations: Arc<dyn ReservationsService>,
    pub incidents: Arc<dyn IncidentsService>,
}
