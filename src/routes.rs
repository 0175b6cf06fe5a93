use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use anyhow::Context;
use http::{HeaderName, HeaderValue, Method, header};
use std::sync::Arc;
use std::time::Duration;
use tower_cookies::CookieManagerLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    handlers,
    middleware_layer::{self, csrf::CSRF_HEADER},
    state::AppState,
};

/// Largest request body accepted; vitals forms and credentials are small.
const BODY_LIMIT: usize = 64 * 1024;

/// Directory the page script and stylesheet are served from.
pub const PUBLIC_DIR: &str = "files/public";

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", o))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::COOKIE,
            HeaderName::from_static(CSRF_HEADER),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400)))
}

/// Builds the application router.
///
/// The router expects to be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`; the sign-in limiter
/// and the API governor key on the peer address.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors = cors_layer(&state.config.cors_origins)?;

    let api_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(50)
            .burst_size(200)
            .use_headers()
            .finish()
            .context("Invalid API rate limit configuration")?,
    );

    let page_routes = Router::new()
        .route("/", get(handlers::page::index))
        .with_state(state.clone());

    let sign_in_routes = Router::new()
        .route("/api/auth/sign-in", post(handlers::auth::sign_in))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::rate_limit::rate_limit_sign_in,
        ))
        .with_state(state.clone());

    // Signing out must work even when the session is already gone.
    let sign_out_routes = Router::new()
        .route("/api/auth/sign-out", post(handlers::auth::sign_out))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/records", get(handlers::records::list_records))
        .route(
            "/api/records/history",
            get(handlers::records::history_fragment),
        )
        .route("/api/analyze", post(handlers::records::analyze))
        .layer(tower_governor::GovernorLayer::new(api_governor_conf))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::csrf::verify_csrf,
        ))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_auth,
        ))
        .with_state(state.clone());

    let app = Router::new()
        .merge(page_routes)
        .merge(sign_in_routes)
        .merge(sign_out_routes)
        .merge(protected_routes)
        .fallback_service(ServeDir::new(PUBLIC_DIR))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false))
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CompressionLayer::new())
        .layer(cors);

    Ok(app)
}
