//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::error;

use crate::web::state::AppState;

/// Middleware that validates the session cookie and extracts the user_id.
///
/// If valid, inserts the user_id into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract cookie header
    let cookie_header = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Parse session token from cookie
    let token = session_token_from_cookie(cookie_header).ok_or(StatusCode::UNAUTHORIZED)?;

    // 3. Validate the session through the gate, get user_id
    let user_id = state.gate.validate(token).await.map_err(|e| {
        error!("Failed to validate session: {:?}", e);
        StatusCode::UNAUTHORIZED
    })?;

    // 4. Insert user_id into request extensions
    req.extensions_mut().insert(user_id);

    // 5. Continue to the handler
    Ok(next.run(req).await)
}

/// Pulls the `session=` value out of a Cookie header.
pub fn session_token_from_cookie(cookie_header: &str) -> Option<&str> {
    cookie_header.split(';').find_map(|c| c.trim().strip_prefix("session="))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_token_is_found_among_other_cookies() {
        assert_eq!(
            session_token_from_cookie("theme=dark; session=abc-123; lang=en"),
            Some("abc-123")
        );
        assert_eq!(session_token_from_cookie("session=abc-123"), Some("abc-123"));
        assert_eq!(session_token_from_cookie("theme=dark"), None);
        assert_eq!(session_token_from_cookie(""), None);
    }
}
