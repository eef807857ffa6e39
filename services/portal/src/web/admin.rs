//! services/portal/src/web/admin.rs
//!
//! Administration endpoints: user management, credential QR codes and the
//! dashboard figures. Every route here sits behind `require_admin`.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use campus_core::domain::{
    AccessRecord, AdminStats, ClassLocation, NewUser, SessionContext, UserQuery, UserUpdate,
};
use campus_core::validation::validate_new_user;
use campus_core::ValidationErrors;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::PortalError;
use crate::web::extract::{AppJson, AppPath, AppQuery};
use crate::web::auth::UserBody;
use crate::web::state::AppState;

pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppQuery(query): AppQuery<UserQuery>,
) -> Result<Json<Vec<UserBody>>, PortalError> {
    let users = state.auth.list_users(&ctx, &query).await?;
    Ok(Json(users.iter().map(UserBody::from).collect()))
}

pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<Json<UserBody>, PortalError> {
    let user = state.auth.get_user(&ctx, user_id).await?;
    Ok(Json(UserBody::from(&user)))
}

pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppJson(mut user): AppJson<NewUser>,
) -> Result<impl IntoResponse, PortalError> {
    user.email = user.email.trim().to_string();
    validate_new_user(&user)?;
    let created = state.auth.create_user(&ctx, &user).await?;
    info!(admin_id = %ctx.user.id, user_id = %created.id, role = created.role.as_str(), "user_created");
    Ok((StatusCode::CREATED, Json(UserBody::from(&created))))
}

pub async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppPath(user_id): AppPath<Uuid>,
    AppJson(update): AppJson<UserUpdate>,
) -> Result<Json<UserBody>, PortalError> {
    // An admin cannot lock themselves out.
    if user_id == ctx.user.id && update.is_active == Some(false) {
        return Err(
            ValidationErrors::single("is_active", "No puedes desactivar tu propia cuenta").into(),
        );
    }
    let updated = state.auth.update_user(&ctx, user_id, &update).await?;
    info!(admin_id = %ctx.user.id, user_id = %user_id, "user_updated");
    Ok(Json(UserBody::from(&updated)))
}

pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<StatusCode, PortalError> {
    if user_id == ctx.user.id {
        return Err(ValidationErrors::single("id", "No puedes eliminar tu propia cuenta").into());
    }
    state.auth.delete_user(&ctx, user_id).await?;
    info!(admin_id = %ctx.user.id, user_id = %user_id, "user_deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/users/{id}/credential-qr - A user's credential QR, as PNG
pub async fn credential_qr_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, PortalError> {
    let png = state.auth.credential_qr(&ctx, user_id).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<AdminStats>, PortalError> {
    Ok(Json(state.auth.admin_stats(&ctx).await?))
}

pub async fn recent_access_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<Vec<AccessRecord>>, PortalError> {
    Ok(Json(state.auth.recent_access(&ctx).await?))
}

pub async fn list_locations_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<Vec<ClassLocation>>, PortalError> {
    Ok(Json(state.auth.list_locations(&ctx).await?))
}
