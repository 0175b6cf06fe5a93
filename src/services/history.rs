use crate::{
    error::{AppError, PersistenceError, Result},
    models::record::VitalsRecord,
    repositories::record::RecordStore,
    services::records,
    state::AppState,
    views,
};

/// How many past records go into a digest.
pub const DIGEST_DEPTH: usize = 3;

/// Digest used when the owner has no records yet.
pub const NO_HISTORY: &str = "No previous history available.";

/// Reloads `owner`'s full history and returns the markup to display.
///
/// When a newer load has already been displayed by the time this one
/// finishes, the newer markup is returned instead of this load's result.
pub async fn reload(state: &AppState, owner: &str) -> Result<String> {
    let ticket = state.board.begin(owner);
    let records = records::query(state.records.as_ref(), owner, None)
        .await
        .map_err(AppError::RecordsUnavailable)?;
    let markup = views::history::render(&records)?;

    if state.board.publish(&ticket, markup.clone()) {
        return Ok(markup);
    }
    Ok(state.board.current(owner).unwrap_or(markup))
}

/// Summarizes `owner`'s most recent records for the inference prompt.
pub async fn summarize(
    store: &dyn RecordStore,
    owner: &str,
) -> std::result::Result<String, PersistenceError> {
    let recent = records::query(store, owner, Some(DIGEST_DEPTH)).await?;
    Ok(digest(&recent))
}

/// Folds the first [`DIGEST_DEPTH`] records (already newest first) into one
/// line each.
pub fn digest(records: &[VitalsRecord]) -> String {
    if records.is_empty() {
        return NO_HISTORY.to_string();
    }

    records
        .iter()
        .take(DIGEST_DEPTH)
        .map(|r| {
            format!(
                "[Date: {}, BP: {}/{}, Sugar: {}, Symptoms: {}]",
                r.date, r.bp_sys, r.bp_dia, r.glucose, r.symptoms
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
