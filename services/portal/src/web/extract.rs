//! services/portal/src/web/extract.rs
//!
//! Extractors whose rejections answer with the portal's JSON error body
//! instead of axum's plain-text one.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use campus_core::ValidationErrors;

use crate::error::PortalError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(PortalError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(PortalError))]
pub struct AppPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(PortalError))]
pub struct AppQuery<T>(pub T);

impl From<JsonRejection> for PortalError {
    fn from(rejection: JsonRejection) -> Self {
        PortalError::Validation(ValidationErrors::single("body", rejection.body_text()))
    }
}

impl From<PathRejection> for PortalError {
    fn from(rejection: PathRejection) -> Self {
        PortalError::Validation(ValidationErrors::single("path", rejection.body_text()))
    }
}

impl From<QueryRejection> for PortalError {
    fn from(rejection: QueryRejection) -> Self {
        PortalError::Validation(ValidationErrors::single("query", rejection.body_text()))
    }
}
