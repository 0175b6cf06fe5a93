use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};
use tower_cookies::Cookies;

use crate::{
    error::Result,
    handlers::auth::create_cookie,
    middleware_layer::{
        auth::{SESSION_COOKIE, extract_session_id},
        csrf::CSRF_COOKIE,
    },
    services::session_gate::{self, AuthTransition},
    state::AppState,
    views,
};

/// Serves the page, restoring the session from its cookie if there is one.
#[axum::debug_handler]
pub async fn index(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    let session_id = extract_session_id(&cookies);
    let session = session_gate::restore(&state, session_id).await?;

    let (transition, busy) = match session {
        Some(session) => {
            refresh_csrf_cookie(&state, &cookies).await?;
            let busy = state.submit_controls.is_engaged(session.owner());
            (AuthTransition::Restored(session), busy)
        }
        None => {
            if session_id.is_some() {
                let mut stale = tower_cookies::Cookie::new(SESSION_COOKIE, "");
                stale.set_path("/");
                cookies.remove(stale);
            }
            (AuthTransition::SignedOut, false)
        }
    };

    let view = session_gate::observe(&state, transition).await?;
    let html = views::page::render(&view, &state.config.identity_client_id, busy)?;
    Ok(Html(html).into_response())
}

/// Issues a new CSRF token when the browser's copy is missing or no longer
/// registered.
async fn refresh_csrf_cookie(state: &AppState, cookies: &Cookies) -> Result<()> {
    if let Some(token) = cookies.get(CSRF_COOKIE) {
        if state.sessions.csrf_is_valid(token.value()).await? {
            return Ok(());
        }
    }

    let token = session_gate::issue_csrf_token(state).await?;
    cookies.add(create_cookie(CSRF_COOKIE, token, state.config.secure_cookies));
    tracing::debug!("🔐 CSRF token reissued");
    Ok(())
}
