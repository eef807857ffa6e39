//! services/portal/src/web/auth.rs
//!
//! Authentication endpoints: login, logout, the current user and their
//! access history. The gateway token is kept in an HttpOnly cookie so the
//! browser never has to store it.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    Extension, Json,
};
use campus_core::domain::{AccessReceipt, AccessRecord, AccessToken, SessionContext, UserProfile};
use campus_core::validation::validate_login;
use campus_core::{PortError, ValidationErrors};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::PortalError;
use crate::web::extract::{AppJson, AppQuery};
use crate::web::state::AppState;

/// Name of the cookie carrying the gateway access token.
pub const SESSION_COOKIE: &str = "session";

/// Expires the session cookie in the browser.
pub const CLEARED_SESSION_COOKIE: &str = "session=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0";

const DEFAULT_HISTORY_LIMIT: u32 = 10;
const MAX_HISTORY_LIMIT: u32 = 100;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a signed-in user.
#[derive(Serialize, ToSchema)]
pub struct UserBody {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub is_admin: bool,
    pub is_staff: bool,
}

impl From<&UserProfile> for UserBody {
    fn from(user: &UserProfile) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role.as_str().to_string(),
            is_admin: user.role.is_admin(),
            is_staff: user.role.is_staff(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserBody,
}

#[derive(Deserialize)]
pub struct HistoryParams {
    pub limit: Option<u32>,
}

#[derive(Deserialize)]
pub struct ScanCodeRequest {
    pub location_code: String,
}

/// The recorded access plus the refreshed history shown under the scanner.
#[derive(Serialize)]
pub struct ScanCodeResponse {
    pub receipt: AccessReceipt,
    pub history: Vec<AccessRecord>,
}

//=========================================================================================
// Session Token Helpers
//=========================================================================================

pub fn session_cookie(token: &AccessToken, ttl: Duration) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        token.as_str(),
        ttl.num_seconds()
    )
}

/// Reads the access token from a `Bearer` header, falling back to the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<AccessToken> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(AccessToken::new(token));
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|t| !t.is_empty())
        .map(AccessToken::new)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/login - Exchange email and password for a session
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; the session cookie is set", body = LoginResponse),
        (status = 400, description = "Malformed email or empty password"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account disabled"),
        (status = 502, description = "Auth service unavailable")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, PortalError> {
    let email = req.email.trim();
    validate_login(email, &req.password)?;

    let grant = state
        .auth
        .login(email, &req.password)
        .await
        .map_err(|e| match e {
            PortError::Unauthorized | PortError::Rejected { status: 400 | 401, .. } => {
                PortalError::InvalidCredentials
            }
            other => PortalError::Port(other),
        })?;

    if !grant.user.is_active {
        return Err(PortalError::Forbidden);
    }

    info!(user_id = %grant.user.id, role = grant.user.role.as_str(), "user_logged_in");
    let cookie = session_cookie(&grant.token, state.config.session_ttl);
    let body = LoginResponse {
        access_token: grant.token.as_str().to_string(),
        user: UserBody::from(&grant.user),
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(body)))
}

/// POST /auth/logout - Clear the session cookie
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out")
    )
)]
pub async fn logout_handler() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, CLEARED_SESSION_COOKIE)],
        Json(serde_json::json!({ "message": "Sesión cerrada" })),
    )
}

/// GET /auth/me - The signed-in user
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserBody),
        (status = 401, description = "Missing or expired session")
    )
)]
pub async fn me_handler(Extension(ctx): Extension<SessionContext>) -> Json<UserBody> {
    Json(UserBody::from(&ctx.user))
}

/// GET /auth/qr/history - Recent QR scans of the signed-in user
pub async fn access_history_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppQuery(params): AppQuery<HistoryParams>,
) -> Result<Json<Vec<AccessRecord>>, PortalError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let records = state.auth.access_history(&ctx, limit).await?;
    Ok(Json(records))
}

/// POST /auth/qr/scan - Record a plain location access, without geofencing
pub async fn scan_code_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppJson(req): AppJson<ScanCodeRequest>,
) -> Result<Json<ScanCodeResponse>, PortalError> {
    let code = req.location_code.trim();
    if code.is_empty() {
        return Err(
            ValidationErrors::single("location_code", "El código de ubicación es obligatorio")
                .into(),
        );
    }
    let receipt = state.auth.scan_location(&ctx, code).await?;
    info!(user_id = %ctx.user.id, location_code = %receipt.location_code, "location_scanned");
    let history = state.auth.access_history(&ctx, DEFAULT_HISTORY_LIMIT).await?;
    Ok(Json(ScanCodeResponse { receipt, history }))
}
