//! services/portal/src/error.rs
//!
//! Defines the primary error type for the portal service and how each
//! error is presented to the browser.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use campus_core::{GeolocationFailure, PortError, ValidationErrors};
use serde_json::json;
use tracing::{error, warn};

use crate::config::ConfigError;
use crate::web::auth::CLEARED_SESSION_COOKIE;

/// The primary error type for the `portal` service.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// A submitted form failed validation before reaching any service.
    #[error("Invalid form: {0}")]
    Validation(#[from] ValidationErrors),

    /// The browser could not provide the device position for a scan.
    #[error("{0}")]
    Geolocation(#[from] GeolocationFailure),

    /// The auth service refused the submitted email and password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No usable session token came with the request.
    #[error("Authentication required")]
    Unauthenticated,

    /// The session is valid but its role does not allow the operation.
    #[error("Not allowed for this role")]
    Forbidden,

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl PortalError {
    pub fn status(&self) -> StatusCode {
        match self {
            PortalError::Validation(_) => StatusCode::BAD_REQUEST,
            PortalError::Geolocation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PortalError::InvalidCredentials | PortalError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            PortalError::Forbidden => StatusCode::FORBIDDEN,
            PortalError::Port(port) => match port {
                PortError::NotFound(_) => StatusCode::NOT_FOUND,
                PortError::Unauthorized => StatusCode::UNAUTHORIZED,
                PortError::Forbidden => StatusCode::FORBIDDEN,
                PortError::Rejected { status, .. } => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
                }
                PortError::Unavailable(_) | PortError::InvalidResponse(_) => {
                    StatusCode::BAD_GATEWAY
                }
                PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            PortalError::Config(_) | PortalError::Io(_) | PortalError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message shown to the user. Upstream rejections are passed through
    /// verbatim; server-side failures are not described.
    fn public_message(&self) -> String {
        match self {
            PortalError::Port(PortError::Rejected { detail, .. }) => detail.clone(),
            PortalError::Port(PortError::NotFound(what)) => format!("No encontrado: {what}"),
            PortalError::InvalidCredentials => "Correo o contraseña incorrectos".to_string(),
            PortalError::Port(PortError::Unauthorized) | PortalError::Unauthenticated => {
                "Sesión expirada o inválida".to_string()
            }
            PortalError::Port(PortError::Forbidden) | PortalError::Forbidden => {
                "No tienes permiso para esta acción".to_string()
            }
            PortalError::Port(PortError::Unavailable(_) | PortError::InvalidResponse(_)) => {
                "El servicio no está disponible, inténtalo de nuevo".to_string()
            }
            PortalError::Validation(_) => "Formulario inválido".to_string(),
            PortalError::Geolocation(failure) => failure.to_string(),
            PortalError::Port(PortError::Unexpected(_))
            | PortalError::Config(_)
            | PortalError::Io(_)
            | PortalError::Internal(_) => "Error interno del servidor".to_string(),
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "request_failed");
        } else {
            warn!(error = %self, status = status.as_u16(), "request_rejected");
        }

        let body = match &self {
            PortalError::Validation(fields) => json!({
                "error": self.public_message(),
                "fields": fields,
            }),
            PortalError::Geolocation(failure) => json!({
                "error": self.public_message(),
                "geolocation": failure,
            }),
            _ => json!({ "error": self.public_message() }),
        };

        // A rejected token ends the browser session, like a logout.
        if status == StatusCode::UNAUTHORIZED {
            return (
                status,
                [(header::SET_COOKIE, CLEARED_SESSION_COOKIE)],
                Json(body),
            )
                .into_response();
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_rejections_keep_status_and_detail() {
        let err = PortalError::from(PortError::Rejected {
            status: 409,
            detail: "El recurso ya está reservado".to_string(),
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.public_message(), "El recurso ya está reservado");
    }

    #[test]
    fn each_geolocation_failure_has_its_own_message() {
        let denied = PortalError::from(GeolocationFailure::PermissionDenied);
        let timeout = PortalError::from(GeolocationFailure::Timeout);
        assert_eq!(denied.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_ne!(denied.public_message(), timeout.public_message());
    }

    #[test]
    fn unauthorized_responses_clear_the_session_cookie() {
        let response = PortalError::Port(PortError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let cookie = response.headers().get(header::SET_COOKIE).unwrap();
        assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn service_outages_map_to_bad_gateway() {
        let err = PortalError::from(PortError::Unavailable("connection refused".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert!(!err.public_message().contains("refused"));
    }
}
