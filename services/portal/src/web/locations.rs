//! services/portal/src/web/locations.rs
//!
//! Staff endpoints for publishing class locations and their QR codes.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use campus_core::domain::{NewLocation, SessionContext};
use campus_core::validation::validate_location;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::PortalError;
use crate::web::extract::{AppJson, AppPath};
use crate::web::state::AppState;

/// POST /locations
pub async fn create_location_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppJson(location): AppJson<NewLocation>,
) -> Result<impl IntoResponse, PortalError> {
    validate_location(&location)?;
    let created = state.auth.create_location(&ctx, &location).await?;
    info!(
        user_id = %ctx.user.id,
        location_id = %created.id,
        location_code = %created.location_code,
        "location_created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /locations/{id}/qr - The printable QR for a location, as PNG
pub async fn location_qr_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppPath(location_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, PortalError> {
    let png = state.auth.location_qr(&ctx, location_id).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
