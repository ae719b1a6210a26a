//! services/api/src/web/tickets.rs
//!
//! Support-ticket endpoints. Status changes here are the write side of the
//! ticket update stream: the database trigger publishes the change and the
//! owner's notification center picks it up.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use campus_portal_core::domain::{Role, Ticket, TicketStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateTicketRequest {
    pub title: String,
    pub description: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateTicketStatusRequest {
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct TicketView {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: String,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl TicketView {
    fn from_domain(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            owner_id: ticket.owner_id,
            title: ticket.title,
            description: ticket.description,
            status: ticket.status.as_str().to_string(),
            updated_at: ticket.updated_at,
        }
    }
}

fn store_error_response(e: campus_portal_core::ports::PortError) -> (StatusCode, String) {
    use campus_portal_core::ports::PortError;
    match e {
        PortError::NotFound(what) => (StatusCode::NOT_FOUND, what),
        PortError::Unauthorized => (StatusCode::FORBIDDEN, "Not allowed".to_string()),
        PortError::Unexpected(msg) => {
            error!("Data store failure: {msg}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
        }
    }
}

/// Only staff may move tickets through the workflow.
async fn require_staff(state: &Arc<AppState>, user_id: Uuid) -> Result<(), (StatusCode, String)> {
    let profile = state
        .gate
        .load_profile(user_id)
        .await
        .map_err(|e| {
            error!("Failed to load profile: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
        })?
        .ok_or((StatusCode::FORBIDDEN, "Profile is incomplete".to_string()))?;

    match profile.role {
        Some(Role::Faculty) | Some(Role::Admin) => Ok(()),
        Some(Role::Student) | None => {
            Err((StatusCode::FORBIDDEN, "Only staff can update ticket status".to_string()))
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /tickets - The caller's tickets, most recently updated first
#[utoipa::path(
    get,
    path = "/tickets",
    responses(
        (status = 200, description = "The caller's tickets", body = Vec<TicketView>),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn list_tickets_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let tickets = state
        .store
        .list_tickets_for(user_id)
        .await
        .map_err(store_error_response)?;

    let views: Vec<TicketView> = tickets.into_iter().map(TicketView::from_domain).collect();
    Ok(Json(views))
}

/// POST /tickets - Open a new support ticket
#[utoipa::path(
    post,
    path = "/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket created", body = TicketView),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn create_ticket_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title is required".to_string()));
    }

    let ticket = state
        .store
        .create_ticket(user_id, req.title.trim(), req.description.trim())
        .await
        .map_err(store_error_response)?;

    Ok((StatusCode::CREATED, Json(TicketView::from_domain(ticket))))
}

/// PUT /tickets/{id}/status - Move a ticket through the workflow
///
/// Staff only. The resulting row update is what feeds the owner's
/// notification stream.
#[utoipa::path(
    put,
    path = "/tickets/{id}/status",
    params(("id" = Uuid, Path, description = "Ticket id")),
    request_body = UpdateTicketStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = TicketView),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Caller is not staff"),
        (status = 404, description = "No such ticket"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn update_ticket_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(ticket_id): Path<Uuid>,
    Json(req): Json<UpdateTicketStatusRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_staff(&state, user_id).await?;

    let status = TicketStatus::parse(&req.status).ok_or((
        StatusCode::BAD_REQUEST,
        format!("'{}' is not a valid ticket status", req.status),
    ))?;

    let ticket = state
        .store
        .update_ticket_status(ticket_id, status)
        .await
        .map_err(store_error_response)?;

    Ok(Json(TicketView::from_domain(ticket)))
}
