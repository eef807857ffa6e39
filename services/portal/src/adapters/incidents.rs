//! services/portal/src/adapters/incidents.rs
//!
//! Adapter for the incidents service: catalogs, tickets, history and comments.

use async_trait::async_trait;
use campus_core::domain::{
    Assignment, CatalogEntry, CatalogKind, Comment, HistoryEntry, NewComment, NewTicket,
    SessionContext, StatusChange, Ticket, TicketFilter, TicketUpdate,
};
use campus_core::ports::{IncidentsService, PortResult};
use reqwest::Method;

use super::gateway::{push_opt, GatewayClient, Listing, Query};

#[derive(Clone)]
pub struct HttpIncidentsService {
    gateway: GatewayClient,
}

impl HttpIncidentsService {
    pub fn new(gateway: GatewayClient) -> Self {
        Self { gateway }
    }
}

fn ticket_path(ticket_id: i64) -> String {
    format!("/tickets/{ticket_id}")
}

#[async_trait]
impl IncidentsService for HttpIncidentsService {
    async fn catalog(&self, ctx: &SessionContext, kind: CatalogKind) -> PortResult<Vec<CatalogEntry>> {
        let listing: Listing<CatalogEntry> = self
            .gateway
            .get_json(
                Some(&ctx.token),
                &format!("/tickets/catalogos/{}", kind.as_path()),
                &Query::new(),
            )
            .await?;
        Ok(listing.into_vec())
    }

    async fn list_tickets(&self, ctx: &SessionContext, filter: &TicketFilter) -> PortResult<Vec<Ticket>> {
        let mut query = Query::new();
        push_opt(&mut query, "estado_codigo", filter.estado_codigo.as_deref());
        push_opt(&mut query, "prioridad_codigo", filter.prioridad_codigo.as_deref());
        push_opt(&mut query, "categoria_codigo", filter.categoria_codigo.as_deref());
        push_opt(&mut query, "limit", filter.limit);
        push_opt(&mut query, "offset", filter.offset);

        let listing: Listing<Ticket> = self
            .gateway
            .get_json(Some(&ctx.token), "/tickets/", &query)
            .await?;
        Ok(listing.into_vec())
    }

    async fn get_ticket(&self, ctx: &SessionContext, ticket_id: i64) -> PortResult<Ticket> {
        self.gateway
            .get_json(Some(&ctx.token), &ticket_path(ticket_id), &Query::new())
            .await
    }

    async fn create_ticket(&self, ctx: &SessionContext, ticket: &NewTicket) -> PortResult<Ticket> {
        self.gateway
            .send_json(Method::POST, Some(&ctx.token), "/tickets/", ticket)
            .await
    }

    async fn update_ticket(&self, ctx: &SessionContext, ticket_id: i64, update: &TicketUpdate) -> PortResult<Ticket> {
        self.gateway
            .send_json(Method::PUT, Some(&ctx.token), &ticket_path(ticket_id), update)
            .await
    }

    async fn delete_ticket(&self, ctx: &SessionContext, ticket_id: i64) -> PortResult<()> {
        self.gateway
            .delete(Some(&ctx.token), &ticket_path(ticket_id), &Query::new())
            .await
    }

    async fn change_status(&self, ctx: &SessionContext, ticket_id: i64, change: &StatusChange) -> PortResult<Ticket> {
        self.gateway
            .send_json(
                Method::POST,
                Some(&ctx.token),
                &format!("{}/cambiar-estado", ticket_path(ticket_id)),
                change,
            )
            .await
    }

    async fn assign(&self, ctx: &SessionContext, ticket_id: i64, assignment: &Assignment) -> PortResult<Ticket> {
        self.gateway
            .send_json(
                Method::POST,
                Some(&ctx.token),
                &format!("{}/asignar", ticket_path(ticket_id)),
                assignment,
            )
            .await
    }

    async fn history(&self, ctx: &SessionContext, ticket_id: i64) -> PortResult<Vec<HistoryEntry>> {
        let listing: Listing<HistoryEntry> = self
            .gateway
            .get_json(
                Some(&ctx.token),
                &format!("{}/historial", ticket_path(ticket_id)),
                &Query::new(),
            )
            .await?;
        Ok(listing.into_vec())
    }

    async fn comments(&self, ctx: &SessionContext, ticket_id: i64, include_internal: bool) -> PortResult<Vec<Comment>> {
        let mut query = Query::new();
        if include_internal {
            query.push(("incluir_internos", "true".to_string()));
        }
        let listing: Listing<Comment> = self
            .gateway
            .get_json(
                Some(&ctx.token),
                &format!("{}/comentarios", ticket_path(ticket_id)),
                &query,
            )
            .await?;
        Ok(listing.into_vec())
    }

    async fn add_comment(&self, ctx: &SessionContext, ticket_id: i64, comment: &NewComment) -> PortResult<Comment> {
        self.gateway
            .send_json(
                Method::POST,
                Some(&ctx.token),
                &format!("{}/comentarios", ticket_path(ticket_id)),
                comment,
            )
            .await
    }
}
