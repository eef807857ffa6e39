//! services/portal/src/adapters/auth.rs
//!
//! Adapter for the auth service: login, profiles, QR credentials, class
//! locations and user administration. Implements the `AuthService` port.

use async_trait::async_trait;
use bytes::Bytes;
use campus_core::domain::{
    AccessReceipt, AccessRecord, AccessToken, AdminStats, ClassLocation, Coordinates, LoginGrant, NewLocation,
    NewUser, ScheduledSession, SessionContext, UserProfile, UserQuery, UserUpdate,
};
use campus_core::ports::{AuthService, PortError, PortResult};
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::gateway::{push_opt, GatewayClient, Listing, Query};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct HttpAuthService {
    gateway: GatewayClient,
}

impl HttpAuthService {
    pub fn new(gateway: GatewayClient) -> Self {
        Self { gateway }
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
struct LoginRecord {
    access_token: String,
    #[serde(default)]
    user: Option<UserProfile>,
}

#[derive(Serialize)]
struct ScanCodeBody<'a> {
    location_code: &'a str,
}

/// A location as stored by the auth service.
#[derive(Deserialize)]
pub(crate) struct LocationRecord {
    id: Uuid,
    location_code: String,
    #[serde(default, alias = "name")]
    location_name: Option<String>,
    latitude: f64,
    longitude: f64,
    class_start: DateTime<Utc>,
    class_end: DateTime<Utc>,
    #[serde(default)]
    grace_period: Option<i64>,
    #[serde(default)]
    is_active: Option<bool>,
    #[serde(default, alias = "expires_at")]
    valid_until: Option<DateTime<Utc>>,
}

impl LocationRecord {
    pub(crate) fn into_domain(self) -> PortResult<ClassLocation> {
        let invalid = |what: &str| {
            PortError::InvalidResponse(format!("location {}: {what}", self.location_code))
        };

        let coordinates = Coordinates::new(self.latitude, self.longitude)
            .ok_or_else(|| invalid("coordinates out of range"))?;
        if self.class_end < self.class_start {
            return Err(invalid("class_end precedes class_start"));
        }
        let grace_period_minutes = self
            .grace_period
            .map(u32::try_from)
            .transpose()
            .map_err(|_| invalid("negative grace_period"))?;

        Ok(ClassLocation {
            id: self.id,
            name: self.location_name.filter(|n| !n.trim().is_empty()),
            coordinates,
            session: ScheduledSession {
                starts_at: self.class_start,
                ends_at: self.class_end,
            },
            grace_period_minutes,
            is_active: self.is_active.unwrap_or(true),
            valid_until: self.valid_until,
            location_code: self.location_code,
        })
    }
}

fn locations_into_domain(records: Vec<LocationRecord>) -> PortResult<Vec<ClassLocation>> {
    records.into_iter().map(LocationRecord::into_domain).collect()
}

//=========================================================================================
// `AuthService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthService for HttpAuthService {
    async fn login(&self, email: &str, password: &str) -> PortResult<LoginGrant> {
        let record: LoginRecord = self
            .gateway
            .post_form("/auth/login", &[("username", email), ("password", password)])
            .await?;
        let token = AccessToken::new(record.access_token);

        // Older auth deployments return only the token.
        let user = match record.user {
            Some(user) => user,
            None => self.current_user(&token).await?,
        };
        Ok(LoginGrant { token, user })
    }

    async fn current_user(&self, token: &AccessToken) -> PortResult<UserProfile> {
        self.gateway
            .get_json(Some(token), "/auth/qr/me", &Query::new())
            .await
    }

    async fn access_history(&self, ctx: &SessionContext, limit: u32) -> PortResult<Vec<AccessRecord>> {
        let query = vec![("limit", limit.to_string())];
        let listing: Listing<AccessRecord> = self
            .gateway
            .get_json(Some(&ctx.token), "/auth/qr/history", &query)
            .await?;
        Ok(listing.into_vec())
    }

    async fn scan_location(&self, ctx: &SessionContext, location_code: &str) -> PortResult<AccessReceipt> {
        self.gateway
            .send_json(
                Method::POST,
                Some(&ctx.token),
                "/auth/qr/scan",
                &ScanCodeBody { location_code },
            )
            .await
    }

    async fn list_locations(&self, ctx: &SessionContext) -> PortResult<Vec<ClassLocation>> {
        let listing: Listing<LocationRecord> = self
            .gateway
            .get_json(Some(&ctx.token), "/auth/admin/locations", &Query::new())
            .await?;
        locations_into_domain(listing.into_vec())
    }

    async fn get_location(&self, token: &AccessToken, location_id: Uuid) -> PortResult<ClassLocation> {
        let record: LocationRecord = self
            .gateway
            .get_json(
                Some(token),
                &format!("/auth/admin/locations/{location_id}"),
                &Query::new(),
            )
            .await?;
        record.into_domain()
    }

    async fn create_location(&self, ctx: &SessionContext, location: &NewLocation) -> PortResult<ClassLocation> {
        let record: LocationRecord = self
            .gateway
            .send_json(
                Method::POST,
                Some(&ctx.token),
                "/auth/admin/qr/generate-location-advanced",
                location,
            )
            .await?;
        record.into_domain()
    }

    async fn location_qr(&self, ctx: &SessionContext, location_id: Uuid) -> PortResult<Bytes> {
        self.gateway
            .get_bytes(
                Some(&ctx.token),
                &format!("/auth/admin/qr/location/{location_id}/image"),
            )
            .await
    }

    async fn credential_qr(&self, ctx: &SessionContext, user_id: Uuid) -> PortResult<Bytes> {
        self.gateway
            .get_bytes(
                Some(&ctx.token),
                &format!("/auth/admin/qr/generate-credential/{user_id}"),
            )
            .await
    }

    async fn list_users(&self, ctx: &SessionContext, query: &UserQuery) -> PortResult<Vec<UserProfile>> {
        let mut params = vec![
            ("skip", query.skip.unwrap_or(0).to_string()),
            ("limit", query.limit.unwrap_or(100).to_string()),
        ];
        push_opt(&mut params, "role", query.role.as_deref());
        let listing: Listing<UserProfile> = self
            .gateway
            .get_json(Some(&ctx.token), "/auth/admin/users", &params)
            .await?;
        Ok(listing.into_vec())
    }

    async fn get_user(&self, ctx: &SessionContext, user_id: Uuid) -> PortResult<UserProfile> {
        self.gateway
            .get_json(
                Some(&ctx.token),
                &format!("/auth/admin/users/{user_id}"),
                &Query::new(),
            )
            .await
    }

    async fn create_user(&self, ctx: &SessionContext, user: &NewUser) -> PortResult<UserProfile> {
        self.gateway
            .send_json(Method::POST, Some(&ctx.token), "/auth/admin/users", user)
            .await
    }

    async fn update_user(
        &self,
        ctx: &SessionContext,
        user_id: Uuid,
        update: &UserUpdate,
    ) -> PortResult<UserProfile> {
        self.gateway
            .send_json(
                Method::PUT,
                Some(&ctx.token),
                &format!("/auth/admin/users/{user_id}"),
                update,
            )
            .await
    }

    async fn delete_user(&self, ctx: &SessionContext, user_id: Uuid) -> PortResult<()> {
        self.gateway
            .delete(
                Some(&ctx.token),
                &format!("/auth/admin/users/{user_id}"),
                &Query::new(),
            )
            .await
    }

    async fn admin_stats(&self, ctx: &SessionContext) -> PortResult<AdminStats> {
        self.gateway
            .get_json(Some(&ctx.token), "/auth/admin/stats", &Query::new())
            .await
    }

    async fn recent_access(&self, ctx: &SessionContext) -> PortResult<Vec<AccessRecord>> {
        let listing: Listing<AccessRecord> = self
            .gateway
            .get_json(Some(&ctx.token), "/auth/admin/recent-access", &Query::new())
            .await?;
        Ok(listing.into_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: serde_json::Value) -> LocationRecord {
        serde_json::from_value(json).unwrap()
    }

    fn base() -> serde_json::Value {
        serde_json::json!({
            "id": "6f9619ff-8b86-d011-b42d-00cf4fc964ff",
            "location_code": "LAB-101",
            "location_name": "Laboratorio 101",
            "latitude": -12.0464,
            "longitude": -77.0428,
            "class_start": "2025-03-10T13:00:00Z",
            "class_end": "2025-03-10T15:00:00Z",
            "grace_period": 10
        })
    }

    #[test]
    fn location_records_become_dated_sessions() {
        let location = record(base()).into_domain().unwrap();
        assert_eq!(location.location_code, "LAB-101");
        assert_eq!(location.grace_period_minutes, Some(10));
        assert!(location.is_active);
        assert_eq!(
            location.session.ends_at - location.session.starts_at,
            chrono::Duration::hours(2)
        );
    }

    #[test]
    fn missing_grace_period_is_left_for_the_default() {
        let mut json = base();
        json["grace_period"] = serde_json::Value::Null;
        assert_eq!(record(json).into_domain().unwrap().grace_period_minutes, None);
    }

    #[test]
    fn inconsistent_locations_are_rejected() {
        let mut json = base();
        json["grace_period"] = serde_json::json!(-5);
        assert!(matches!(record(json).into_domain(), Err(PortError::InvalidResponse(_))));

        let mut json = base();
        json["latitude"] = serde_json::json!(123.0);
        assert!(matches!(record(json).into_domain(), Err(PortError::InvalidResponse(_))));

        let mut json = base();
        json["class_end"] = serde_json::json!("2025-03-10T12:00:00Z");
        assert!(matches!(record(json).into_domain(), Err(PortError::InvalidResponse(_))));
    }
}
