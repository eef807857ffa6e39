pub mod admin;
pub mod attendance;
pub mod auth;
pub mod extract;
pub mod incidents;
pub mod locations;
pub mod middleware;
pub mod reservations;
pub mod rest;
pub mod router;
pub mod state;

pub use middleware::{require_admin, require_auth, require_staff};
pub use router::build_router;
