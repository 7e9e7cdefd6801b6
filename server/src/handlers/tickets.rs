use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::auth::AdminUser;
use crate::handlers::IdQuery;
use crate::models::ticket::TicketTypeRequest;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{JsonBody, QueryParams};
use crate::utils::response::{ack, created};

/// GET /tickets
pub async fn list_tickets(State(state): State<AppState>) -> Result<Response, AppError> {
    let tickets = state.catalog.list().await?;
    Ok(Json(tickets).into_response())
}

/// POST /tickets
pub async fn create_ticket(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    JsonBody(body): JsonBody<TicketTypeRequest>,
) -> Result<Response, AppError> {
    let ticket = state
        .catalog
        .create(
            body.name.as_deref().unwrap_or_default(),
            body.price.unwrap_or_default(),
        )
        .await?;
    Ok(created(ticket.id).into_response())
}

/// PUT /tickets?id=
pub async fn update_ticket(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    QueryParams(query): QueryParams<IdQuery>,
    JsonBody(body): JsonBody<TicketTypeRequest>,
) -> Result<Response, AppError> {
    let id = query.require("Ticket")?;
    state
        .catalog
        .update(
            id,
            body.name.as_deref().unwrap_or_default(),
            body.price.unwrap_or_default(),
        )
        .await?;
    Ok(ack().into_response())
}

/// DELETE /tickets?id=
pub async fn delete_ticket(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    QueryParams(query): QueryParams<IdQuery>,
) -> Result<Response, AppError> {
    let id = query.require("Ticket")?;
    state.catalog.delete(id).await?;
    Ok(ack().into_response())
}
