use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{error::AppError, services::session_gate, state::AppState};

/// Name of the cookie holding the session id.
pub const SESSION_COOKIE: &str = "session_id";

/// Extracts the session id from the request cookies.
///
/// # Arguments
///
/// * `cookies` - The request cookies.
///
/// # Returns
///
/// An `Option` containing the session ID if found.
pub fn extract_session_id(cookies: &Cookies) -> Option<Uuid> {
    cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// A middleware that requires a valid session to be present.
///
/// On success the [`Session`](crate::models::session::Session) is available
/// to handlers as an `Extension`.
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    tracing::debug!("🔐 Checking authentication...");

    let Some(session_id) = extract_session_id(&cookies) else {
        tracing::warn!("❌ No session_id cookie found");
        return AppError::Unauthorized("Not signed in".to_string()).into_response();
    };

    let session = match session_gate::restore(&state, Some(session_id)).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            tracing::warn!("❌ Session {} not found or expired", session_id);
            return AppError::Unauthorized("Session expired".to_string()).into_response();
        }
        Err(e) => return e.into_response(),
    };

    tracing::debug!("✅ User authenticated: {}", session.owner());

    request.extensions_mut().insert(session);

    next.run(request).await
}
