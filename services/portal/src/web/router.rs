//! services/portal/src/web/router.rs
//!
//! Assembles the portal's routes and their guards.

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::ConfigError;
use crate::error::PortalError;
use crate::web::{
    admin, attendance, auth, incidents, locations,
    middleware::{require_admin, require_auth, require_staff},
    reservations,
    rest::health_handler,
    state::AppState,
};

/// Builds the application router with CORS for the configured browser origin.
pub fn build_router(app_state: Arc<AppState>) -> Result<Router, PortalError> {
    let origin = app_state
        .config
        .allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| ConfigError::InvalidValue("ALLOWED_ORIGIN".to_string(), e.to_string()))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Teachers and admins
    let staff_routes = Router::new()
        .route("/locations", post(locations::create_location_handler))
        .route("/locations/{id}/qr", get(locations::location_qr_handler))
        .route_layer(axum_middleware::from_fn(require_staff));

    // Admins only
    let admin_routes = Router::new()
        .route(
            "/admin/users",
            get(admin::list_users_handler).post(admin::create_user_handler),
        )
        .route(
            "/admin/users/{id}",
            get(admin::get_user_handler)
                .put(admin::update_user_handler)
                .delete(admin::delete_user_handler),
        )
        .route("/admin/users/{id}/credential-qr", get(admin::credential_qr_handler))
        .route("/admin/stats", get(admin::stats_handler))
        .route("/admin/recent-access", get(admin::recent_access_handler))
        .route("/admin/locations", get(admin::list_locations_handler))
        .route_layer(axum_middleware::from_fn(require_admin));

    // Any signed-in user
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/auth/qr/history", get(auth::access_history_handler))
        .route("/auth/qr/scan", post(auth::scan_code_handler))
        .route("/attendance/scan", post(attendance::scan_handler))
        .route("/attendance/reports", get(attendance::reports_handler))
        .route("/attendance/reports/export", get(attendance::export_reports_handler))
        .route("/attendance/history", get(attendance::history_handler))
        .route("/reservations", post(reservations::create_reservation_handler))
        .route(
            "/reservations/{id}",
            axum::routing::delete(reservations::cancel_reservation_handler),
        )
        .route("/reservations/mine", get(reservations::my_reservations_handler))
        .route("/reservations/resources", get(reservations::list_resources_handler))
        .route("/reservations/resources/types", get(reservations::resource_kinds_handler))
        .route("/reservations/resources/{id}", get(reservations::get_resource_handler))
        .route(
            "/reservations/resources/{id}/availability",
            get(reservations::availability_handler),
        )
        .route("/incidents/catalogs/{kind}", get(incidents::catalog_handler))
        .route(
            "/incidents/tickets",
            get(incidents::list_tickets_handler).post(incidents::create_ticket_handler),
        )
        .route(
            "/incidents/tickets/{id}",
            get(incidents::get_ticket_handler)
                .put(incidents::update_ticket_handler)
                .delete(incidents::delete_ticket_handler),
        )
        .route("/incidents/tickets/{id}/status", post(incidents::change_status_handler))
        .route("/incidents/tickets/{id}/assign", post(incidents::assign_handler))
        .route("/incidents/tickets/{id}/history", get(incidents::history_handler))
        .route(
            "/incidents/tickets/{id}/comments",
            get(incidents::list_comments_handler).post(incidents::add_comment_handler),
        )
        .merge(staff_routes)
        .merge(admin_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Ok(Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state))
}
