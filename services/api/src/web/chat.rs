//! services/api/src/web/chat.rs
//!
//! The AI assistant endpoint. One completion per submitted message; the
//! client keeps the conversation and resends the turns it wants the model
//! to see.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use campus_portal_core::domain::{ChatTurn, Role, Speaker};
use campus_portal_core::ports::PortError;
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
pub struct ChatTurnBody {
    /// "user" or "assistant".
    pub speaker: String,
    pub text: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    /// Prior turns of the conversation, oldest first.
    #[serde(default)]
    pub history: Vec<ChatTurnBody>,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    pub reply: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /chat - Ask the campus assistant a question
///
/// The assistant's persona follows the caller's role, so students and staff
/// get answers framed for their side of the portal.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "The assistant's reply", body = ChatResponse),
        (status = 400, description = "Invalid request"),
        (status = 502, description = "The completion service failed"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.message.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Message is required".to_string()));
    }

    // Default to the student persona until a role is chosen.
    let role = state
        .gate
        .load_profile(user_id)
        .await
        .map_err(|e| {
            error!("Failed to load profile: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
        })?
        .and_then(|p| p.role)
        .unwrap_or(Role::Student);

    let mut history = Vec::with_capacity(req.history.len());
    for turn in &req.history {
        let speaker = match turn.speaker.as_str() {
            "user" => Speaker::User,
            "assistant" => Speaker::Assistant,
            other => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    format!("'{other}' is not a valid speaker"),
                ));
            }
        };
        history.push(ChatTurn { speaker, text: turn.text.clone() });
    }

    let reply = state
        .chat
        .complete(role, &history, &req.message)
        .await
        .map_err(|e| match e {
            PortError::Unexpected(msg) => {
                error!("Chat completion failed: {msg}");
                (StatusCode::BAD_GATEWAY, "Sorry, I encountered an error. Please try again.".to_string())
            }
            other => {
                error!("Chat completion failed: {other}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        })?;

    Ok(Json(ChatResponse { reply }))
}
