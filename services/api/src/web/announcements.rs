//! services/api/src/web/announcements.rs
//!
//! Announcement endpoints. Posting is the write side of the broadcast
//! stream: the database trigger fans the insert out to every attached
//! notification center whose audience matches.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use campus_portal_core::domain::{Announcement, Audience, Role};
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
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub content: String,
    /// One of "all", "students", "faculty".
    pub audience: String,
}

#[derive(Serialize, ToSchema)]
pub struct AnnouncementView {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub audience: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl AnnouncementView {
    fn from_domain(announcement: Announcement) -> Self {
        Self {
            id: announcement.id,
            author_id: announcement.author_id,
            title: announcement.title,
            content: announcement.content,
            audience: announcement.audience.as_str().to_string(),
            created_at: announcement.created_at,
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

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /announcements - All announcements addressed to the caller's role
#[utoipa::path(
    get,
    path = "/announcements",
    responses(
        (status = 200, description = "Announcements visible to the caller", body = Vec<AnnouncementView>),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn list_announcements_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let role = state
        .gate
        .load_profile(user_id)
        .await
        .map_err(|e| {
            error!("Failed to load profile: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
        })?
        .and_then(|p| p.role);

    let announcements = state
        .store
        .list_announcements()
        .await
        .map_err(store_error_response)?;

    // Apply the same audience filter the live stream applies, so the page
    // and the notification log never disagree.
    let views: Vec<AnnouncementView> = announcements
        .into_iter()
        .filter(|a| role.map(|r| a.audience.includes(r)).unwrap_or(false))
        .map(AnnouncementView::from_domain)
        .collect();

    Ok(Json(views))
}

/// POST /announcements - Publish a campus announcement (staff only)
#[utoipa::path(
    post,
    path = "/announcements",
    request_body = CreateAnnouncementRequest,
    responses(
        (status = 201, description = "Announcement published", body = AnnouncementView),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Caller is not staff"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn create_announcement_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateAnnouncementRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
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
        Some(Role::Faculty) | Some(Role::Admin) => {}
        Some(Role::Student) | None => {
            return Err((
                StatusCode::FORBIDDEN,
                "Only staff can publish announcements".to_string(),
            ));
        }
    }

    if req.title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title is required".to_string()));
    }

    let audience = Audience::parse(&req.audience).ok_or((
        StatusCode::BAD_REQUEST,
        format!("'{}' is not a valid audience", req.audience),
    ))?;

    let announcement = state
        .store
        .insert_announcement(user_id, req.title.trim(), req.content.trim(), audience)
        .await
        .map_err(store_error_response)?;

    Ok((StatusCode::CREATED, Json(AnnouncementView::from_domain(announcement))))
}
