//! Sign-in state and the choice of visible region.

use uuid::Uuid;
use zeroize::Zeroizing;

use crate::{
    crypto::csrf::generate_csrf_token,
    error::Result,
    models::session::Session,
    services::history,
    state::AppState,
};

/// A change of authentication state.
#[derive(Debug, Clone)]
pub enum AuthTransition {
    /// A sign-in just succeeded.
    SignedIn(Session),
    /// An existing session was picked up on page load.
    Restored(Session),
    /// The user signed out, or no valid session exists.
    SignedOut,
}

/// Which region of the page is visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateView {
    /// The sign-in region.
    LoggedOut,
    /// The dashboard with the user's name and history list.
    Dashboard {
        display_name: String,
        history_html: String,
    },
}

/// Everything produced by a successful sign-in.
#[derive(Debug)]
pub struct SignedIn {
    pub session_id: Uuid,
    pub session: Session,
    pub csrf_token: String,
    pub view: GateView,
}

/// Reacts to an authentication transition. Called exactly once per
/// transition; signing in or restoring loads the user's history.
pub async fn observe(state: &AppState, transition: AuthTransition) -> Result<GateView> {
    match transition {
        AuthTransition::SignedIn(session) | AuthTransition::Restored(session) => {
            let history_html = history::reload(state, session.owner()).await?;
            Ok(GateView::Dashboard {
                display_name: session.principal.display_name,
                history_html,
            })
        }
        AuthTransition::SignedOut => Ok(GateView::LoggedOut),
    }
}

/// Verifies `credential` with the identity provider and opens a session.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `credential` - The token returned by the provider's sign-in popup.
///
/// # Returns
///
/// The new session, its CSRF token and the dashboard view. A rejected
/// credential or a failed history load leaves no session behind.
pub async fn sign_in(state: &AppState, credential: Zeroizing<String>) -> Result<SignedIn> {
    let principal = state.identity.verify(credential.as_str()).await?;
    drop(credential);

    let session = Session::new(principal, state.config.session_ttl());
    let view = observe(state, AuthTransition::SignedIn(session.clone())).await?;

    let session_id = Uuid::new_v4();
    state
        .sessions
        .put_session(session_id, &session, session_ttl_secs(state))
        .await?;

    let csrf_token = match issue_csrf_token(state).await {
        Ok(token) => token,
        Err(e) => {
            if let Err(cleanup) = state.sessions.delete_session(session_id).await {
                tracing::warn!("Failed to delete session {}: {}", session_id, cleanup);
            }
            return Err(e);
        }
    };
    tracing::info!("✅ Session {} opened for {}", session_id, session.owner());

    Ok(SignedIn {
        session_id,
        session,
        csrf_token,
        view,
    })
}

fn session_ttl_secs(state: &AppState) -> u64 {
    state.config.session_ttl().num_seconds().max(1) as u64
}

/// Registers a fresh CSRF token that lives as long as a session.
pub async fn issue_csrf_token(state: &AppState) -> Result<String> {
    let token = generate_csrf_token();
    state
        .sessions
        .put_csrf(&token, session_ttl_secs(state))
        .await?;
    Ok(token)
}

/// Looks up the session behind a cookie. Expired sessions are deleted and
/// reported as absent.
pub async fn restore(state: &AppState, session_id: Option<Uuid>) -> Result<Option<Session>> {
    let Some(session_id) = session_id else {
        return Ok(None);
    };

    match state.sessions.get_session(session_id).await? {
        Some(session) if session.is_expired() => {
            tracing::warn!("❌ Session expired for user: {}", session.owner());
            if let Err(e) = state.sessions.delete_session(session_id).await {
                tracing::warn!("Failed to delete expired session {}: {}", session_id, e);
            }
            Ok(None)
        }
        other => Ok(other),
    }
}

/// Ends the session unconditionally. Store failures are logged; the caller
/// always ends up signed out.
pub async fn sign_out(
    state: &AppState,
    session_id: Option<Uuid>,
    csrf_token: Option<&str>,
) -> GateView {
    if let Some(session_id) = session_id {
        match state.sessions.get_session(session_id).await {
            Ok(Some(session)) => {
                state.board.clear(session.owner());
                tracing::info!("👋 Signing out {}", session.owner());
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Could not load session {} on sign-out: {}", session_id, e),
        }
        if let Err(e) = state.sessions.delete_session(session_id).await {
            tracing::warn!("Failed to delete session {}: {}", session_id, e);
        }
    }

    if let Some(token) = csrf_token {
        if let Err(e) = state.sessions.delete_csrf(token).await {
            tracing::warn!("Failed to delete CSRF token: {}", e);
        }
    }

    GateView::LoggedOut
}
