//! services/api/src/web/profile.rs
//!
//! Profile endpoints and the route-access decision endpoint the SPA router
//! consults before navigating.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use campus_portal_core::domain::{Profile, ProfilePatch, Role, Session};
use campus_portal_core::routes::{navigation_for, resolve_route_access, RouteAccess};
use campus_portal_core::session::ValidationError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ProfileView {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Option<String>,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub year_of_study: Option<i32>,
    pub phone_number: Option<String>,
    pub is_complete: bool,
}

impl ProfileView {
    fn from_domain(profile: Profile) -> Self {
        let is_complete = profile.is_complete();
        Self {
            user_id: profile.user_id,
            full_name: profile.full_name,
            email: profile.email,
            role: profile.role.map(|r| r.as_str().to_string()),
            student_id: profile.student_id,
            department: profile.department,
            year_of_study: profile.year_of_study,
            phone_number: profile.phone_number,
            is_complete,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub year_of_study: Option<i32>,
    pub phone_number: Option<String>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct AccessParams {
    /// The path the client wants to navigate to.
    pub path: String,
}

#[derive(Serialize, ToSchema)]
pub struct NavEntryView {
    pub name: &'static str,
    pub href: &'static str,
}

#[derive(Serialize, ToSchema)]
pub struct AccessResponse {
    pub allow: bool,
    pub redirect_to: Option<String>,
    /// The navigation menu for the session's role; empty until the profile
    /// is complete.
    pub navigation: Vec<NavEntryView>,
}

fn validation_error_response(e: ValidationError) -> (StatusCode, String) {
    match e {
        ValidationError::MissingField(_) | ValidationError::InvalidValue { .. } => {
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        ValidationError::Backend(msg) => {
            error!("Profile update failed: {msg}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to update profile".to_string())
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /profile - The current user's profile
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "The current profile", body = ProfileView),
        (status = 404, description = "Profile has not been created yet"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn get_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let profile = state
        .gate
        .load_profile(user_id)
        .await
        .map_err(|e| {
            error!("Failed to load profile: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load profile".to_string())
        })?
        .ok_or((StatusCode::NOT_FOUND, "Profile not found".to_string()))?;

    Ok(Json(ProfileView::from_domain(profile)))
}

/// PUT /profile - Partially update the current user's profile
///
/// Once the required fields are present, route access unblocks on the next
/// navigation and the user's notification subscriptions open.
#[utoipa::path(
    put,
    path = "/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileView),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let role = match req.role.as_deref() {
        Some(raw) => Some(Role::parse(raw).ok_or((
            StatusCode::BAD_REQUEST,
            format!("'{raw}' is not a valid role"),
        ))?),
        None => None,
    };

    let patch = ProfilePatch {
        full_name: req.full_name,
        role,
        student_id: req.student_id,
        department: req.department,
        year_of_study: req.year_of_study,
        phone_number: req.phone_number,
    };

    let profile = state
        .gate
        .update_profile(user_id, patch)
        .await
        .map_err(validation_error_response)?;

    if let Some(role) = profile.role {
        state.hub.attach(user_id, role);
    }

    Ok(Json(ProfileView::from_domain(profile)))
}

/// GET /access - Route-gate decision for a path
///
/// The SPA router calls this before rendering a protected screen, so
/// protected content never flashes while the session is unresolved.
#[utoipa::path(
    get,
    path = "/access",
    params(AccessParams),
    responses(
        (status = 200, description = "The access decision", body = AccessResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn access_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(params): Query<AccessParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let profile = state.gate.load_profile(user_id).await.map_err(|e| {
        error!("Failed to load profile: {e}");
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load profile".to_string())
    })?;

    // The middleware has already resolved the identity; reconstruct the
    // session the pure gate expects.
    let session = Session {
        user_id,
        email: profile.as_ref().map(|p| p.email.clone()).unwrap_or_default(),
        token: String::new(),
    };

    let decision = resolve_route_access(&params.path, Some(&session), profile.as_ref());
    let response = match decision {
        RouteAccess::Allow => {
            let navigation = profile
                .as_ref()
                .and_then(|p| p.role)
                .map(|role| {
                    navigation_for(role)
                        .iter()
                        .map(|e| NavEntryView { name: e.name, href: e.href })
                        .collect()
                })
                .unwrap_or_default();
            AccessResponse { allow: true, redirect_to: None, navigation }
        }
        RouteAccess::Redirect(to) => AccessResponse {
            allow: false,
            redirect_to: Some(to.to_string()),
            navigation: Vec::new(),
        },
    };

    Ok(Json(response))
}
