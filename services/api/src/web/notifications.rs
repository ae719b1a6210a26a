//! services/api/src/web/notifications.rs
//!
//! Read side of the notification hub: the displayable log with relative
//! timestamps, plus the two read-state mutations.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use campus_portal_core::domain::NotificationEvent;
use campus_portal_core::notifications::MarkOutcome;
use campus_portal_core::timefmt::time_ago;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

//=========================================================================================
// Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct NotificationView {
    pub id: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    /// Relative age, e.g. "Just now" or "5m ago".
    pub time_ago: String,
}

impl NotificationView {
    fn from_domain(event: &NotificationEvent) -> Self {
        Self {
            id: event.id.clone(),
            kind: event.kind.as_str().to_string(),
            title: event.title.clone(),
            message: event.message.clone(),
            read: event.read,
            time_ago: time_ago(event.created_at, Utc::now()),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationView>,
    pub unread_count: usize,
}

/// Makes sure the caller has a live notification center. Subscriptions
/// normally open at sign-in, but a server restart loses them; reattach
/// from the stored role instead of failing.
async fn ensure_attached(state: &Arc<AppState>, user_id: Uuid) {
    if state.hub.is_attached(user_id) {
        return;
    }
    match state.gate.load_profile(user_id).await {
        Ok(Some(profile)) => {
            if let Some(role) = profile.role {
                state.hub.attach(user_id, role);
            }
        }
        Ok(None) => {}
        Err(e) => error!("Failed to load profile for user {user_id}: {e}"),
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /notifications - The caller's notification log, most recent first
#[utoipa::path(
    get,
    path = "/notifications",
    responses(
        (status = 200, description = "The displayable notification log", body = NotificationListResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn list_notifications_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    ensure_attached(&state, user_id).await;

    let response = match state.hub.snapshot(user_id).await {
        Some(snapshot) => NotificationListResponse {
            notifications: snapshot.events.iter().map(NotificationView::from_domain).collect(),
            unread_count: snapshot.unread_count,
        },
        // Users without a role have no subscriptions yet; show an empty log.
        None => NotificationListResponse { notifications: Vec::new(), unread_count: 0 },
    };

    Ok(Json(response))
}

/// POST /notifications/{id}/read - Mark one notification as read
#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Marked as read (idempotent)"),
        (status = 404, description = "No such notification"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn mark_read_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    ensure_attached(&state, user_id).await;

    // Re-marking an already-read notification is a successful no-op, not an
    // unknown id.
    match state.hub.mark_as_read(user_id, &id).await {
        MarkOutcome::Marked | MarkOutcome::AlreadyRead => Ok(StatusCode::OK),
        MarkOutcome::Missing => {
            Err((StatusCode::NOT_FOUND, "Notification not found".to_string()))
        }
    }
}

/// POST /notifications/read-all - Mark every notification as read
#[utoipa::path(
    post,
    path = "/notifications/read-all",
    responses(
        (status = 200, description = "All notifications marked as read"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn mark_all_read_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    ensure_attached(&state, user_id).await;
    state.hub.mark_all_as_read(user_id).await;
    Ok(StatusCode::OK)
}
