//! services/portal/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification and the health check.

use axum::Json;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::web::attendance::{ScanRequest, ScanResponse};
use crate::web::auth::{LoginRequest, LoginResponse, UserBody};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::auth::me_handler,
        crate::web::attendance::scan_handler,
        crate::web::attendance::reports_handler,
        crate::web::attendance::export_reports_handler,
    ),
    components(
        schemas(HealthResponse, LoginRequest, LoginResponse, UserBody, ScanRequest, ScanResponse)
    ),
    tags(
        (name = "Campus360 Portal API", description = "Browser-facing API for attendance, reservations and incidents.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Health
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
}

/// GET /health - Liveness check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "The portal is up", body = HealthResponse)
    )
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
