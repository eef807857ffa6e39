//! services/portal/src/adapters/reservations.rs
//!
//! Adapter for the reservations service (resources, availability, bookings).

use async_trait::async_trait;
use campus_core::domain::{
    Availability, NewReservation, Reservation, Resource, ResourceFilter, ResourceKind,
    SessionContext,
};
use campus_core::ports::{PortResult, ReservationsService};
use reqwest::Method;
use uuid::Uuid;

use super::gateway::{push_opt, GatewayClient, Listing, Query};

const DEFAULT_RESOURCE_PAGE_SIZE: u32 = 50;
const DEFAULT_RESERVATION_PAGE_SIZE: u32 = 20;

#[derive(Clone)]
pub struct HttpReservationsService {
    gateway: GatewayClient,
}

impl HttpReservationsService {
    pub fn new(gateway: GatewayClient) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl ReservationsService for HttpReservationsService {
    async fn list_resources(&self, ctx: &SessionContext, filter: &ResourceFilter) -> PortResult<Vec<Resource>> {
        let mut query = vec![
            ("page", filter.page.unwrap_or(1).to_string()),
            (
                "page_size",
                filter.page_size.unwrap_or(DEFAULT_RESOURCE_PAGE_SIZE).to_string(),
            ),
        ];
        push_opt(&mut query, "tipo", filter.tipo.as_deref());
        // The browser lists only bookable resources unless asked otherwise.
        push_opt(&mut query, "estado", Some(filter.estado.as_deref().unwrap_or("disponible")));

        let listing: Listing<Resource> = self
            .gateway
            .get_json(Some(&ctx.token), "/recursos", &query)
            .await?;
        Ok(listing.into_vec())
    }

    async fn resource_kinds(&self, ctx: &SessionContext) -> PortResult<Vec<ResourceKind>> {
        let listing: Listing<ResourceKind> = self
            .gateway
            .get_json(Some(&ctx.token), "/recursos/tipos", &Query::new())
            .await?;
        Ok(listing.into_vec())
    }

    async fn get_resource(&self, ctx: &SessionContext, resource_id: &str) -> PortResult<Resource> {
        self.gateway
            .get_json(Some(&ctx.token), &format!("/recursos/{resource_id}"), &Query::new())
            .await
    }

    async fn availability(&self, ctx: &SessionContext, resource_id: &str, date: &str) -> PortResult<Availability> {
        let query = vec![("fecha", date.to_string())];
        self.gateway
            .get_json(
                Some(&ctx.token),
                &format!("/recursos/{resource_id}/disponibilidad"),
                &query,
            )
            .await
    }

    async fn user_reservations(
        &self,
        ctx: &SessionContext,
        user_id: Uuid,
        estado: Option<&str>,
    ) -> PortResult<Vec<Reservation>> {
        let mut query = vec![
            ("page", "1".to_string()),
            ("page_size", DEFAULT_RESERVATION_PAGE_SIZE.to_string()),
        ];
        push_opt(&mut query, "estado", estado);

        let listing: Listing<Reservation> = self
            .gateway
            .get_json(
                Some(&ctx.token),
                &format!("/reservas/usuario/{user_id}"),
                &query,
            )
            .await?;
        Ok(listing.into_vec())
    }

    async fn create_reservation(&self, ctx: &SessionContext, reservation: &NewReservation) -> PortResult<Reservation> {
        self.gateway
            .send_json(Method::POST, Some(&ctx.token), "/reservas/", reservation)
            .await
    }

    async fn cancel_reservation(
        &self,
        ctx: &SessionContext,
        reservation_id: &str,
        user_id: Uuid,
        motivo: Option<&str>,
    ) -> PortResult<()> {
        let mut query = vec![("usuario_id", user_id.to_string())];
        push_opt(&mut query, "motivo", motivo.filter(|m| !m.is_empty()));
        self.gateway
            .delete(
                Some(&ctx.token),
                &format!("/reservas/{reservation_id}"),
                &query,
            )
            .await
    }
}
