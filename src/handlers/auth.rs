use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use tower_cookies::{Cookie, Cookies};
use zeroize::Zeroizing;

use crate::{
    error::Result,
    middleware_layer::{
        auth::{SESSION_COOKIE, extract_session_id},
        csrf::CSRF_COOKIE,
    },
    services::session_gate::{self, GateView},
    state::AppState,
    validation::auth::{SignInRequest, validate_sign_in},
};

/// The response payload for a successful sign-in.
#[derive(Serialize)]
pub struct SignInResponse {
    pub success: bool,
    pub display_name: String,
    pub history_html: String,
}

/// Creates a cookie scoped to the whole site.
///
/// No max-age is set: both cookies die with the browser session, and the
/// server-side entries expire on their own.
pub fn create_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);

    // The page script needs to read the CSRF token to echo it in a header.
    if name != CSRF_COOKIE {
        cookie.set_http_only(true);
    }

    if secure {
        cookie.set_secure(true);
    }

    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_path("/");

    cookie
}

fn expire_cookie(cookies: &Cookies, name: &'static str) {
    let mut cookie = Cookie::new(name, "");
    cookie.set_path("/");
    cookies.remove(cookie);
}

/// Handles sign-in with an identity provider credential.
#[axum::debug_handler]
pub async fn sign_in(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<SignInRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Sign-in attempt");
    validate_sign_in(&payload)?;

    let signed_in = session_gate::sign_in(&state, Zeroizing::new(payload.credential)).await?;

    cookies.add(create_cookie(
        SESSION_COOKIE,
        signed_in.session_id.to_string(),
        state.config.secure_cookies,
    ));
    cookies.add(create_cookie(
        CSRF_COOKIE,
        signed_in.csrf_token,
        state.config.secure_cookies,
    ));
    tracing::info!("✅ User signed in: {}", signed_in.session.owner());

    let (display_name, history_html) = match signed_in.view {
        GateView::Dashboard {
            display_name,
            history_html,
        } => (display_name, history_html),
        GateView::LoggedOut => (signed_in.session.principal.display_name, String::new()),
    };

    let response = SignInResponse {
        success: true,
        display_name,
        history_html,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles sign-out. Always succeeds and sends the browser back to `/`,
/// which then renders the signed-out page.
#[axum::debug_handler]
pub async fn sign_out(State(state): State<AppState>, cookies: Cookies) -> Response {
    let session_id = extract_session_id(&cookies);
    let csrf_token = cookies.get(CSRF_COOKIE).map(|c| c.value().to_string());

    session_gate::sign_out(&state, session_id, csrf_token.as_deref()).await;

    expire_cookie(&cookies, SESSION_COOKIE);
    expire_cookie(&cookies, CSRF_COOKIE);
    tracing::info!("✅ Signed out");

    Redirect::to("/").into_response()
}
