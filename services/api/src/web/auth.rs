//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: signup, login, logout, and the redirect-based
//! federated sign-in flow.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect},
    Json,
};
use campus_portal_core::domain::NewProfile;
use campus_portal_core::session::AuthError;
use chrono::Duration;
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
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct FederatedCallbackParams {
    /// Identity asserted by the provider; the assertion itself is validated
    /// upstream of this service.
    pub email: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn session_cookie(token: &str) -> String {
    format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        token,
        Duration::days(30).num_seconds()
    )
}

const CLEARED_COOKIE: &str = "session=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0";

fn auth_error_response(e: AuthError) -> (StatusCode, String) {
    match e {
        AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, e.to_string()),
        AuthError::Backend(msg) => {
            error!("Identity backend failure: {msg}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Authentication backend unavailable".to_string())
        }
    }
}

/// Opens the user's notification subscriptions once their role is known.
/// Users whose profile is still incomplete are attached later, when the
/// role is set.
async fn attach_notifications(state: &Arc<AppState>, user_id: Uuid) {
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

/// POST /auth/signup - Create a new account and its profile
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.full_name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Full name is required".to_string()));
    }

    let session = state
        .gate
        .sign_up(
            &req.email,
            &req.password,
            NewProfile {
                full_name: req.full_name,
                role: None,
                student_id: None,
                department: None,
                year_of_study: None,
                phone_number: None,
            },
        )
        .await
        .map_err(auth_error_response)?;

    let response = AuthResponse { user_id: session.user_id, email: session.email.clone() };
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, session_cookie(&session.token))],
        Json(response),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session = state
        .gate
        .sign_in(&req.email, &req.password)
        .await
        .map_err(auth_error_response)?;

    attach_notifications(&state, session.user_id).await;

    let response = AuthResponse { user_id: session.user_id, email: session.email.clone() };
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&session.token))],
        Json(response),
    ))
}

/// POST /auth/logout - Logout and invalidate session
///
/// Also tears down the user's notification subscriptions and discards their
/// in-memory log; signing back in starts from an empty log.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let cookie_header = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    let token = crate::web::middleware::session_token_from_cookie(cookie_header)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    // Derived state goes first, then the backend session.
    if let Ok(user_id) = state.gate.validate(token).await {
        state.hub.detach(user_id);
    }

    state.gate.sign_out(token).await.map_err(auth_error_response)?;

    Ok((StatusCode::OK, [(header::SET_COOKIE, CLEARED_COOKIE.to_string())]))
}

/// GET /auth/federated - Start the redirect-based federated sign-in flow
#[utoipa::path(
    get,
    path = "/auth/federated",
    responses(
        (status = 303, description = "Redirect to the identity provider"),
        (status = 500, description = "No provider configured")
    )
)]
pub async fn federated_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let url = state
        .gate
        .begin_federated_sign_in()
        .await
        .map_err(auth_error_response)?;
    Ok(Redirect::to(&url))
}

/// GET /auth/callback - Complete the federated sign-in flow
///
/// The provider redirects back here; the profile is created lazily on first
/// sign-in, leaving the user on the completion screen until it is filled in.
#[utoipa::path(
    get,
    path = "/auth/callback",
    params(FederatedCallbackParams),
    responses(
        (status = 303, description = "Session opened, redirect into the app"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn federated_callback_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FederatedCallbackParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session = state
        .gate
        .complete_federated_sign_in(&params.email)
        .await
        .map_err(auth_error_response)?;

    attach_notifications(&state, session.user_id).await;

    Ok((
        [(header::SET_COOKIE, session_cookie(&session.token))],
        Redirect::to("/"),
    ))
}
