use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    models::{
        record::{VitalsForm, VitalsRecord},
        session::Session,
    },
    services::{history, records, submission},
    state::AppState,
};

/// The largest page a single listing may request.
const MAX_LIMIT: usize = 1000;

/// The query parameters for listing records.
#[derive(Deserialize)]
pub struct ListRecordsQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct ListRecordsResponse {
    pub records: Vec<VitalsRecord>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub history_html: String,
}

/// Lists the signed-in user's records, newest first.
#[axum::debug_handler]
pub async fn list_records(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListRecordsQuery>,
) -> Result<Response> {
    if query.limit.is_some_and(|l| l == 0 || l > MAX_LIMIT) {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }

    let records = records::query(state.records.as_ref(), session.owner(), query.limit)
        .await
        .map_err(AppError::RecordsUnavailable)?;
    let count = records.len();

    Ok((StatusCode::OK, Json(ListRecordsResponse { records, count })).into_response())
}

/// Reloads and renders the signed-in user's history list.
#[axum::debug_handler]
pub async fn history_fragment(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response> {
    let history_html = history::reload(&state, session.owner()).await?;
    Ok((StatusCode::OK, Json(HistoryResponse { history_html })).into_response())
}

/// Analyzes the submitted vitals and stores them with the analysis.
#[axum::debug_handler]
pub async fn analyze(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(form): Json<VitalsForm>,
) -> Result<Response> {
    let outcome = submission::submit(&state, &session, form).await?;
    Ok((StatusCode::OK, Json(outcome)).into_response())
}
