//! services/portal/src/web/incidents.rs
//!
//! Incident tickets: catalogs, CRUD, workflow actions and comments.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use campus_core::domain::{
    Assignment, CatalogEntry, CatalogKind, Comment, HistoryEntry, NewComment, NewTicket,
    SessionContext, StatusChange, Ticket, TicketFilter, TicketUpdate,
};
use campus_core::validation::{validate_comment, validate_ticket};
use campus_core::ValidationErrors;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::error::PortalError;
use crate::web::extract::{AppJson, AppPath, AppQuery};
use crate::web::state::AppState;

#[derive(Deserialize)]
pub struct CommentParams {
    pub incluir_internos: Option<bool>,
}

pub async fn catalog_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppPath(kind): AppPath<CatalogKind>,
) -> Result<Json<Vec<CatalogEntry>>, PortalError> {
    Ok(Json(state.incidents.catalog(&ctx, kind).await?))
}

pub async fn list_tickets_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppQuery(filter): AppQuery<TicketFilter>,
) -> Result<Json<Vec<Ticket>>, PortalError> {
    Ok(Json(state.incidents.list_tickets(&ctx, &filter).await?))
}

pub async fn create_ticket_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppJson(ticket): AppJson<NewTicket>,
) -> Result<impl IntoResponse, PortalError> {
    validate_ticket(&ticket)?;
    let created = state.incidents.create_ticket(&ctx, &ticket).await?;
    info!(user_id = %ctx.user.id, ticket_id = created.id, "ticket_created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_ticket_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppPath(ticket_id): AppPath<i64>,
) -> Result<Json<Ticket>, PortalError> {
    Ok(Json(state.incidents.get_ticket(&ctx, ticket_id).await?))
}

pub async fn update_ticket_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppPath(ticket_id): AppPath<i64>,
    AppJson(update): AppJson<TicketUpdate>,
) -> Result<Json<Ticket>, PortalError> {
    if update.titulo.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ValidationErrors::single("titulo", "El título no puede estar vacío").into());
    }
    Ok(Json(state.incidents.update_ticket(&ctx, ticket_id, &update).await?))
}

pub async fn delete_ticket_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppPath(ticket_id): AppPath<i64>,
) -> Result<StatusCode, PortalError> {
    state.incidents.delete_ticket(&ctx, ticket_id).await?;
    info!(user_id = %ctx.user.id, ticket_id, "ticket_deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppPath(ticket_id): AppPath<i64>,
    AppJson(change): AppJson<StatusChange>,
) -> Result<Json<Ticket>, PortalError> {
    if change.estado_codigo.trim().is_empty() {
        return Err(ValidationErrors::single("estado_codigo", "El estado es obligatorio").into());
    }
    let ticket = state.incidents.change_status(&ctx, ticket_id, &change).await?;
    info!(ticket_id, estado = %ticket.estado_codigo, "ticket_status_changed");
    Ok(Json(ticket))
}

/// Assigning a responsible person is a staff action.
pub async fn assign_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppPath(ticket_id): AppPath<i64>,
    AppJson(assignment): AppJson<Assignment>,
) -> Result<Json<Ticket>, PortalError> {
    if !ctx.user.role.is_staff() {
        return Err(PortalError::Forbidden);
    }
    if assignment.responsable_id.trim().is_empty() {
        return Err(
            ValidationErrors::single("responsable_id", "El responsable es obligatorio").into(),
        );
    }
    Ok(Json(state.incidents.assign(&ctx, ticket_id, &assignment).await?))
}

pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppPath(ticket_id): AppPath<i64>,
) -> Result<Json<Vec<HistoryEntry>>, PortalError> {
    Ok(Json(state.incidents.history(&ctx, ticket_id).await?))
}

/// Internal comments are only ever shown to staff.
pub async fn list_comments_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppPath(ticket_id): AppPath<i64>,
    AppQuery(params): AppQuery<CommentParams>,
) -> Result<Json<Vec<Comment>>, PortalError> {
    let include_internal = ctx.user.role.is_staff() && params.incluir_internos.unwrap_or(true);
    let mut comments = state
        .incidents
        .comments(&ctx, ticket_id, include_internal)
        .await?;
    // The service may ignore the flag; never hand internal notes to students.
    if !include_internal {
        comments.retain(|c| !c.es_interno);
    }
    Ok(Json(comments))
}

pub async fn add_comment_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    AppPath(ticket_id): AppPath<i64>,
    AppJson(mut comment): AppJson<NewComment>,
) -> Result<impl IntoResponse, PortalError> {
    validate_comment(&comment)?;
    if !ctx.user.role.is_staff() {
        comment.es_interno = false;
    }
    let created = state.incidents.add_comment(&ctx, ticket_id, &comment).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
