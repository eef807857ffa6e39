//! services/portal/src/web/attendance.rs
//!
//! Attendance endpoints: the live QR scan and the classified reports built
//! from stored logs.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use campus_core::attendance::device_position;
use campus_core::domain::{
    AttendanceRegistration, AttendanceStatus, HistoryFilter, ScanEvent, SessionContext,
};
use campus_core::report::{build_report, export_csv, AttendanceReport};
use campus_core::{GeolocationFailure, PortError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::PortalError;
use crate::web::extract::{AppJson, AppQuery};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// A decoded location QR together with what the browser knew about the device position.
#[derive(Deserialize, ToSchema)]
pub struct ScanRequest {
    /// Raw QR payload. Anything that is not a location id reads as an expired code.
    pub location_id: String,
    pub user_latitude: Option<f64>,
    pub user_longitude: Option<f64>,
    /// Set when the browser could not read the position:
    /// `permission_denied`, `position_unavailable`, `timeout` or `unsupported`.
    #[schema(value_type = Option<String>)]
    pub geolocation_error: Option<GeolocationFailure>,
}

#[derive(Serialize, ToSchema)]
pub struct ScanResponse {
    /// ON_TIME, LATE, ABSENT, INVALID_LOCATION or EXPIRED.
    pub status: String,
    pub label: String,
    pub severity: String,
    pub delay_minutes: Option<i64>,
    pub distance_meters: Option<f64>,
    pub location_code: Option<String>,
    pub location_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Whether the attempt was stored by the attendance service.
    pub registered: bool,
}

#[derive(Deserialize)]
pub struct ReportParams {
    pub location_code: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /attendance/scan - Classify and register a QR scan
#[utoipa::path(
    post,
    path = "/attendance/scan",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Scan classified", body = ScanResponse),
        (status = 401, description = "Missing or expired session"),
        (status = 422, description = "The device position could not be obtained"),
        (status = 502, description = "A backend service is unavailable")
    )
)]
pub async fn scan_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppJson(req): AppJson<ScanRequest>,
) -> Result<impl IntoResponse, PortalError> {
    let position = device_position(req.user_latitude, req.user_longitude, req.geolocation_error)
        .inspect_err(|failure| {
            warn!(user_id = %ctx.user.id, reason = ?failure, "scan_without_position");
        })?;

    // An unknown or unreadable code is an expired QR, not an error.
    let matched_location = match Uuid::parse_str(req.location_id.trim()) {
        Ok(location_id) => {
            let token = state.config.service_token.as_ref().unwrap_or(&ctx.token);
            match state.auth.get_location(token, location_id).await {
                Ok(location) => Some(location),
                Err(PortError::NotFound(_)) => None,
                Err(e) => return Err(e.into()),
            }
        }
        Err(_) => None,
    };

    let event = ScanEvent {
        timestamp: Utc::now(),
        position: Some(position),
        matched_location,
    };
    let status = event.classify()?;
    let distance = event.distance_meters().map(round_meters);
    info!(
        user_id = %ctx.user.id,
        qr_payload = %req.location_id,
        status = status.code(),
        distance_meters = distance,
        "scan_classified"
    );

    let mut registered = false;
    if let Some(location) = event.matched_location.as_ref() {
        if status != AttendanceStatus::Expired {
            let registration = AttendanceRegistration {
                user_id: ctx.user.id,
                location_id: location.id,
                location_code: location.location_code.clone(),
                timestamp: event.timestamp,
                status: status.code(),
                delay_minutes: delay_of(&status),
                distance_meters: distance,
                user_latitude: position.latitude,
                user_longitude: position.longitude,
            };
            state.attendance.register(&ctx, &registration).await?;
            registered = true;
        }
    }

    Ok(Json(ScanResponse {
        status: status.code().to_string(),
        label: status.label().to_string(),
        severity: status.severity().as_str().to_string(),
        delay_minutes: delay_of(&status),
        distance_meters: distance,
        location_code: event.matched_location.as_ref().map(|l| l.location_code.clone()),
        location_name: event.matched_location.as_ref().and_then(|l| l.name.clone()),
        timestamp: event.timestamp,
        registered,
    }))
}

/// GET /attendance/reports - Classified attendance of every student
#[utoipa::path(
    get,
    path = "/attendance/reports",
    params(
        ("location_code" = Option<String>, Query, description = "Restrict rows to one location; TODOS keeps all")
    ),
    responses(
        (status = 200, description = "Report rows, summary stats and the location filter options"),
        (status = 401, description = "Missing or expired session"),
        (status = 403, description = "Only staff can read reports")
    )
)]
pub async fn reports_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppQuery(params): AppQuery<ReportParams>,
) -> Result<Json<AttendanceReport>, PortalError> {
    if !ctx.user.role.is_staff() {
        return Err(PortalError::Forbidden);
    }
    let logs = state.attendance.reports(&ctx).await?;
    let report = build_report(
        &logs,
        params.location_code.as_deref(),
        state.config.campus_offset,
        Utc::now(),
    );
    Ok(Json(report))
}

/// GET /attendance/reports/export - The same report as a CSV download
#[utoipa::path(
    get,
    path = "/attendance/reports/export",
    params(
        ("location_code" = Option<String>, Query, description = "Restrict rows to one location; TODOS keeps all")
    ),
    responses(
        (status = 200, description = "CSV with Estudiante, Ubicación, Fecha, Hora and Estado columns", body = String, content_type = "text/csv"),
        (status = 401, description = "Missing or expired session"),
        (status = 403, description = "Only staff can export reports")
    )
)]
pub async fn export_reports_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppQuery(params): AppQuery<ReportParams>,
) -> Result<impl IntoResponse, PortalError> {
    if !ctx.user.role.is_staff() {
        return Err(PortalError::Forbidden);
    }
    let now = Utc::now();
    let logs = state.attendance.reports(&ctx).await?;
    let report = build_report(
        &logs,
        params.location_code.as_deref(),
        state.config.campus_offset,
        now,
    );
    let filename = format!(
        "reporte_asistencia_{}.csv",
        now.with_timezone(&state.config.campus_offset).format("%Y-%m-%d")
    );
    info!(user_id = %ctx.user.id, rows = report.rows.len(), "report_exported");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        export_csv(&report.rows),
    ))
}

/// GET /attendance/history - Filtered attendance history
///
/// Students only ever see their own records.
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppQuery(mut filter): AppQuery<HistoryFilter>,
) -> Result<Json<AttendanceReport>, PortalError> {
    if !ctx.user.role.is_staff() {
        filter.user_id = Some(ctx.user.id);
    }
    let logs = state.attendance.history(&ctx, &filter).await?;
    let report = build_report(&logs, None, state.config.campus_offset, Utc::now());
    Ok(Json(report))
}

fn delay_of(status: &AttendanceStatus) -> Option<i64> {
    match status {
        AttendanceStatus::Late { delay_minutes } => Some(*delay_minutes),
        _ => None,
    }
}

fn round_meters(meters: f64) -> f64 {
    (meters * 10.0).round() / 10.0
}
