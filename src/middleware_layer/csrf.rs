use axum::{
    body::Body,
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_cookies::Cookies;

use crate::{crypto::csrf::tokens_match, error::AppError, state::AppState};

/// Name of the cookie holding the CSRF token; readable by the page script.
pub const CSRF_COOKIE: &str = "csrf_token";

/// Header the page script copies the token into.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// A middleware that verifies the CSRF token on state-changing requests.
///
/// The token must be present in both the cookie and the header, the two
/// copies must match, and the token must still be registered server-side.
pub async fn verify_csrf(
    State(state): State<AppState>,
    cookies: Cookies,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() == Method::GET
        || req.method() == Method::HEAD
        || req.method() == Method::OPTIONS
    {
        tracing::debug!("✅ CSRF exemption: {} request", req.method());
        return next.run(req).await;
    }

    let Some(cookie_token) = cookies.get(CSRF_COOKIE).map(|c| c.value().to_string()) else {
        tracing::warn!("❌ CSRF: csrf_token cookie missing");
        return AppError::Unauthorized("Missing CSRF token cookie".to_string()).into_response();
    };

    let header_token = match req.headers().get(CSRF_HEADER).map(|v| v.to_str()) {
        Some(Ok(token)) => token.to_string(),
        Some(Err(_)) => {
            tracing::warn!("❌ CSRF: malformed header");
            return AppError::Unauthorized("Invalid CSRF token format".to_string())
                .into_response();
        }
        None => {
            tracing::warn!("❌ CSRF: x-csrf-token header missing");
            return AppError::Unauthorized("Missing CSRF token header".to_string())
                .into_response();
        }
    };

    if !tokens_match(&cookie_token, &header_token) {
        tracing::warn!("❌ CSRF: tokens do not match");
        return AppError::Unauthorized("CSRF token mismatch".to_string()).into_response();
    }

    match state.sessions.csrf_is_valid(&cookie_token).await {
        Ok(true) => {
            tracing::debug!("✅ CSRF token valid");
            next.run(req).await
        }
        Ok(false) => {
            tracing::warn!("❌ CSRF: token expired or unknown");
            AppError::Unauthorized("CSRF token expired or invalid".to_string()).into_response()
        }
        Err(e) => {
            tracing::error!("❌ CSRF: session store error: {}", e);
            AppError::Unauthorized("CSRF validation error".to_string()).into_response()
        }
    }
}
