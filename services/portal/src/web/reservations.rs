//! services/portal/src/web/reservations.rs
//!
//! Resource browsing and booking on behalf of the signed-in user.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use campus_core::availability::{is_slot_free, parse_clock};
use campus_core::domain::{
    Availability, NewReservation, Reservation, Resource, ResourceFilter, ResourceKind,
    SessionContext,
};
use campus_core::validation::validate_reservation;
use campus_core::ValidationErrors;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::error::PortalError;
use crate::web::extract::{AppJson, AppPath, AppQuery};
use crate::web::state::AppState;

#[derive(Deserialize)]
pub struct AvailabilityParams {
    pub fecha: String,
}

#[derive(Deserialize)]
pub struct MineParams {
    pub estado: Option<String>,
}

#[derive(Deserialize)]
pub struct CancelParams {
    pub motivo: Option<String>,
}

/// Booking form as sent by the browser. The user fields are filled from the session.
#[derive(Deserialize)]
pub struct ReservationRequest {
    pub recurso_id: String,
    pub fecha: String,
    pub hora_inicio: String,
    pub hora_fin: String,
    #[serde(default)]
    pub motivo: Option<String>,
    #[serde(default = "one")]
    pub num_asistentes: u32,
}

fn one() -> u32 {
    1
}

impl ReservationRequest {
    fn for_user(self, ctx: &SessionContext) -> NewReservation {
        NewReservation {
            recurso_id: self.recurso_id,
            fecha: self.fecha,
            hora_inicio: self.hora_inicio,
            hora_fin: self.hora_fin,
            usuario_id: ctx.user.id,
            usuario_nombre: ctx
                .user
                .full_name
                .clone()
                .unwrap_or_else(|| ctx.user.email.clone()),
            usuario_email: ctx.user.email.clone(),
            motivo: self.motivo.filter(|m| !m.trim().is_empty()),
            num_asistentes: self.num_asistentes,
        }
    }
}

/// GET /reservations/resources
pub async fn list_resources_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppQuery(filter): AppQuery<ResourceFilter>,
) -> Result<Json<Vec<Resource>>, PortalError> {
    Ok(Json(state.reservations.list_resources(&ctx, &filter).await?))
}

/// GET /reservations/resources/types
pub async fn resource_kinds_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<Vec<ResourceKind>>, PortalError> {
    Ok(Json(state.reservations.resource_kinds(&ctx).await?))
}

/// GET /reservations/resources/{id}
pub async fn get_resource_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppPath(resource_id): AppPath<String>,
) -> Result<Json<Resource>, PortalError> {
    Ok(Json(state.reservations.get_resource(&ctx, &resource_id).await?))
}

/// GET /reservations/resources/{id}/availability?fecha=
pub async fn availability_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppPath(resource_id): AppPath<String>,
    AppQuery(params): AppQuery<AvailabilityParams>,
) -> Result<Json<Availability>, PortalError> {
    let availability = state
        .reservations
        .availability(&ctx, &resource_id, &params.fecha)
        .await?;
    Ok(Json(availability))
}

/// GET /reservations/mine
pub async fn my_reservations_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppQuery(params): AppQuery<MineParams>,
) -> Result<Json<Vec<Reservation>>, PortalError> {
    let reservations = state
        .reservations
        .user_reservations(&ctx, ctx.user.id, params.estado.as_deref())
        .await?;
    Ok(Json(reservations))
}

/// POST /reservations
///
/// The requested slot is checked against the occupied slots of that day
/// before the booking is forwarded.
pub async fn create_reservation_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppJson(req): AppJson<ReservationRequest>,
) -> Result<impl IntoResponse, PortalError> {
    let reservation = req.for_user(&ctx);
    validate_reservation(&reservation)?;

    let availability = state
        .reservations
        .availability(&ctx, &reservation.recurso_id, &reservation.fecha)
        .await?;
    let (Some(start), Some(end)) = (
        parse_clock(&reservation.hora_inicio),
        parse_clock(&reservation.hora_fin),
    ) else {
        return Err(ValidationErrors::single("hora_inicio", "Hora inválida").into());
    };
    if !is_slot_free(start, end, &availability.horarios_ocupados) {
        return Err(ValidationErrors::single(
            "hora_inicio",
            "El horario seleccionado se cruza con una reserva existente",
        )
        .into());
    }

    let created = state.reservations.create_reservation(&ctx, &reservation).await?;
    info!(
        user_id = %ctx.user.id,
        reservation_id = %created.id,
        recurso_id = %created.recurso_id,
        "reservation_created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /reservations/{id}
pub async fn cancel_reservation_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppPath(reservation_id): AppPath<String>,
    AppQuery(params): AppQuery<CancelParams>,
) -> Result<StatusCode, PortalError> {
    state
        .reservations
        .cancel_reservation(&ctx, &reservation_id, ctx.user.id, params.motivo.as_deref())
        .await?;
    info!(user_id = %ctx.user.id, reservation_id = %reservation_id, "reservation_cancelled");
    Ok(StatusCode::NO_CONTENT)
}
