//! services/portal/src/web/middleware.rs
//!
//! Session and role guards for protected routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use campus_core::domain::SessionContext;
use std::sync::Arc;
use tracing::debug;

use crate::error::PortalError;
use crate::web::auth::session_token;
use crate::web::state::AppState;

/// Resolves the request's access token into a `SessionContext`.
///
/// The token is checked against the auth service on every request, so a
/// revoked or expired token is rejected with 401 and the cookie is cleared.
/// On success the context is inserted into request extensions for handlers.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, PortalError> {
    let token = session_token(req.headers()).ok_or(PortalError::Unauthenticated)?;
    let user = state.auth.current_user(&token).await?;
    if !user.is_active {
        return Err(PortalError::Forbidden);
    }

    debug!(user_id = %user.id, role = user.role.as_str(), "session_resolved");
    req.extensions_mut().insert(SessionContext::new(token, user));
    Ok(next.run(req).await)
}

/// Lets through admins only. Must run after `require_auth`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, PortalError> {
    let ctx = session(&req)?;
    if !ctx.user.role.is_admin() {
        return Err(PortalError::Forbidden);
    }
    Ok(next.run(req).await)
}

/// Lets through teachers and admins. Must run after `require_auth`.
pub async fn require_staff(req: Request, next: Next) -> Result<Response, PortalError> {
    let ctx = session(&req)?;
    if !ctx.user.role.is_staff() {
        return Err(PortalError::Forbidden);
    }
    Ok(next.run(req).await)
}

fn session(req: &Request) -> Result<&SessionContext, PortalError> {
    req.extensions()
        .get::<SessionContext>()
        .ok_or(PortalError::Unauthenticated)
}
