use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use crate::{error::AppError, state::AppState};

/// Sign-in attempts allowed per address within one window.
pub const SIGN_IN_ATTEMPTS: u64 = 10;

/// Length of the sign-in window in seconds.
pub const SIGN_IN_WINDOW_SECS: u64 = 15 * 60;

/// Extracts the peer IP address from the request extensions.
///
/// # Returns
///
/// The IP address as a string, or "unknown" if not found.
fn extract_real_ip(req: &Request<Body>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// A middleware that rate limits sign-in attempts per address.
///
/// When the session store is unavailable the request is let through; the
/// sign-in itself will then fail on the same store.
pub async fn rate_limit_sign_in(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = extract_real_ip(&req);
    let key = format!("rate_limit:sign_in:{}", ip);

    match state.sessions.record_attempt(&key, SIGN_IN_WINDOW_SECS).await {
        Ok(attempts) if attempts > SIGN_IN_ATTEMPTS => {
            return AppError::RateLimitExceeded(format!(
                "Too many sign-in attempts. Try again in {} minutes",
                SIGN_IN_WINDOW_SECS / 60
            ))
            .into_response();
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("⚠️ Sign-in rate limit unavailable for {}: {}", ip, e),
    }

    next.run(req).await
}
