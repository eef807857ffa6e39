//! crates/campus_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the Campus360 backend services.
//! These traits form the boundary of the hexagonal architecture: the portal only
//! talks to the auth, attendance, reservations and incidents services through them,
//! and the gateway adapters provide the concrete implementations.

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::domain::{
    AccessReceipt, AccessRecord, AccessToken, AdminStats, Assignment, AttendanceLog, AttendanceRegistration,
    Availability, CatalogEntry, CatalogKind, ClassLocation, Comment, HistoryEntry, HistoryFilter,
    LoginGrant, NewComment, NewLocation, NewReservation, NewTicket, NewUser, Reservation,
    Resource, ResourceFilter, ResourceKind, SessionContext, StatusChange, Ticket, TicketFilter,
    TicketUpdate, UserProfile, UserQuery, UserUpdate,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the transport errors of the individual services.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    /// The service refused the request; `detail` is its own explanation.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid response from service: {0}")]
    InvalidResponse(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AuthService: Send + Sync {
    // --- Session ---
    async fn login(&self, email: &str, password: &str) -> PortResult<LoginGrant>;

    /// Resolves the user behind a token. Fails with `Unauthorized` for
    /// expired or unknown tokens.
    async fn current_user(&self, token: &AccessToken) -> PortResult<UserProfile>;

    async fn access_history(&self, ctx: &SessionContext, limit: u32) -> PortResult<Vec<AccessRecord>>;

    /// Records a plain access at a location identified by its code, without
    /// geofencing or schedule checks.
    async fn scan_location(&self, ctx: &SessionContext, location_code: &str) -> PortResult<AccessReceipt>;

    // --- Locations ---
    async fn list_locations(&self, ctx: &SessionContext) -> PortResult<Vec<ClassLocation>>;

    /// Location lookup for live scans. Takes a bare token so the caller can use
    /// a credential allowed to read locations, which students' tokens are not.
    async fn get_location(&self, token: &AccessToken, location_id: Uuid) -> PortResult<ClassLocation>;

    async fn create_location(&self, ctx: &SessionContext, location: &NewLocation) -> PortResult<ClassLocation>;

    /// PNG image of the QR code that points at a location.
    async fn location_qr(&self, ctx: &SessionContext, location_id: Uuid) -> PortResult<Bytes>;

    /// PNG image of a user's personal credential QR code.
    async fn credential_qr(&self, ctx: &SessionContext, user_id: Uuid) -> PortResult<Bytes>;

    // --- User Administration ---
    async fn list_users(&self, ctx: &SessionContext, query: &UserQuery) -> PortResult<Vec<UserProfile>>;

    async fn get_user(&self, ctx: &SessionContext, user_id: Uuid) -> PortResult<UserProfile>;

    async fn create_user(&self, ctx: &SessionContext, user: &NewUser) -> PortResult<UserProfile>;

    async fn update_user(
        &self,
        ctx: &SessionContext,
        user_id: Uuid,
        update: &UserUpdate,
    ) -> PortResult<UserProfile>;

    async fn delete_user(&self, ctx: &SessionContext, user_id: Uuid) -> PortResult<()>;

    async fn admin_stats(&self, ctx: &SessionContext) -> PortResult<AdminStats>;

    async fn recent_access(&self, ctx: &SessionContext) -> PortResult<Vec<AccessRecord>>;
}

#[async_trait]
pub trait AttendanceService: Send + Sync {
    /// Records a classified check-in.
    async fn register(
        &self,
        ctx: &SessionContext,
        registration: &AttendanceRegistration,
    ) -> PortResult<()>;

    async fn history(&self, ctx: &SessionContext, filter: &HistoryFilter) -> PortResult<Vec<AttendanceLog>>;

    /// Every log the caller may see, used by the reports view.
    async fn reports(&self, ctx: &SessionContext) -> PortResult<Vec<AttendanceLog>>;
}

#[async_trait]
pub trait ReservationsService: Send + Sync {
    async fn list_resources(&self, ctx: &SessionContext, filter: &ResourceFilter) -> PortResult<Vec<Resource>>;

    async fn resource_kinds(&self, ctx: &SessionContext) -> PortResult<Vec<ResourceKind>>;

    async fn get_resource(&self, ctx: &SessionContext, resource_id: &str) -> PortResult<Resource>;

    /// Occupied slots of a resource on a `YYYY-MM-DD` date.
    async fn availability(&self, ctx: &SessionContext, resource_id: &str, date: &str) -> PortResult<Availability>;

    async fn user_reservations(
        &self,
        ctx: &SessionContext,
        user_id: Uuid,
        estado: Option<&str>,
    ) -> PortResult<Vec<Reservation>>;

    async fn create_reservation(&self, ctx: &SessionContext, reservation: &NewReservation) -> PortResult<Reservation>;

    /// Only the owner may cancel; the service checks `user_id` against the reservation.
    async fn cancel_reservation(
        &self,
        ctx: &SessionContext,
        reservation_id: &str,
        user_id: Uuid,
        motivo: Option<&str>,
    ) -> PortResult<()>;
}

#[async_trait]
pub trait IncidentsService: Send + Sync {
    async fn catalog(&self, ctx: &SessionContext, kind: CatalogKind) -> PortResult<Vec<CatalogEntry>>;

    async fn list_tickets(&self, ctx: &SessionContext, filter: &TicketFilter) -> PortResult<Vec<Ticket>>;

    async fn get_ticket(&self, ctx: &SessionContext, ticket_id: i64) -> PortResult<Ticket>;

    async fn create_ticket(&self, ctx: &SessionContext, ticket: &NewTicket) -> PortResult<Ticket>;

    async fn update_ticket(&self, ctx: &SessionContext, ticket_id: i64, update: &TicketUpdate) -> PortResult<Ticket>;

    async fn delete_ticket(&self, ctx: &SessionContext, ticket_id: i64) -> PortResult<()>;

    async fn change_status(&self, ctx: &SessionContext, ticket_id: i64, change: &StatusChange) -> PortResult<Ticket>;

    async fn assign(&self, ctx: &SessionContext, ticket_id: i64, assignment: &Assignment) -> PortResult<Ticket>;

    async fn history(&self, ctx: &SessionContext, ticket_id: i64) -> PortResult<Vec<HistoryEntry>>;

    async fn comments(&self, ctx: &SessionContext, ticket_id: i64, include_internal: bool) -> PortResult<Vec<Comment>>;

    async fn add_comment(&self, ctx: &SessionContext, ticket_id: i64, comment: &NewComment) -> PortResult<Comment>;
}
