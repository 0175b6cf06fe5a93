use crate::{
    error::PersistenceError,
    models::{record::VitalsRecord, session::Session},
    repositories::record::RecordStore,
};

/// Writes `record` on behalf of the signed-in user.
///
/// # Arguments
///
/// * `store` - The record store.
/// * `session` - The current session, if any.
/// * `record` - The record to write; its owner must be the session's principal.
///
/// # Returns
///
/// `Ok(())` once the store has accepted the write.
pub async fn insert(
    store: &dyn RecordStore,
    session: Option<&Session>,
    record: &VitalsRecord,
) -> Result<(), PersistenceError> {
    let session = session.ok_or(PersistenceError::NoActiveSession)?;

    if record.owner_uid != session.owner() {
        tracing::warn!(
            "❌ Refusing to store record owned by {} for session of {}",
            record.owner_uid,
            session.owner()
        );
        return Err(PersistenceError::OwnerMismatch);
    }

    store.insert(record).await?;
    tracing::info!("✅ Record {} saved for {}", record.id, record.owner_uid);
    Ok(())
}

/// Lists `owner`'s records, newest first.
pub async fn query(
    store: &dyn RecordStore,
    owner: &str,
    limit: Option<usize>,
) -> Result<Vec<VitalsRecord>, PersistenceError> {
    let records = store.query(owner, limit).await?;
    tracing::debug!("📚 Loaded {} records for {}", records.len(), owner);
    Ok(records)
}
