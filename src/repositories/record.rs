use async_trait::async_trait;
use deadpool_postgres::Pool;

use crate::{error::PersistenceError, models::record::VitalsRecord};

/// Storage for vitals records, scoped by owner.
///
/// Implementations must apply the owner filter themselves so a query can
/// never observe another principal's records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Writes one record.
    async fn insert(&self, record: &VitalsRecord) -> Result<(), PersistenceError>;

    /// Returns `owner`'s records, newest first, at most `limit` of them.
    async fn query(
        &self,
        owner: &str,
        limit: Option<usize>,
    ) -> Result<Vec<VitalsRecord>, PersistenceError>;
}

/// `RecordStore` backed by the `health_records` table.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: Pool,
}

impl PgRecordStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, record: &VitalsRecord) -> Result<(), PersistenceError> {
        let client = self.pool.get().await?;
        client
            .execute(
                r#"
                INSERT INTO health_records (
                    id, owner_uid, bp_sys, bp_dia, glucose, heart,
                    chronic, symptoms, display_date, created_at, ai_analysis
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
                &[
                    &record.id,
                    &record.owner_uid,
                    &record.bp_sys,
                    &record.bp_dia,
                    &record.glucose,
                    &record.heart,
                    &record.chronic,
                    &record.symptoms,
                    &record.date,
                    &record.created_at,
                    &record.ai_analysis,
                ],
            )
            .await?;
        tracing::debug!("💾 Record {} stored for {}", record.id, record.owner_uid);
        Ok(())
    }

    async fn query(
        &self,
        owner: &str,
        limit: Option<usize>,
    ) -> Result<Vec<VitalsRecord>, PersistenceError> {
        // LIMIT NULL means no limit in PostgreSQL.
        let limit = limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"
                SELECT id, owner_uid, bp_sys, bp_dia, glucose, heart,
                       chronic, symptoms, display_date, created_at, ai_analysis
                FROM health_records
                WHERE owner_uid = $1
                ORDER BY created_at DESC, seq DESC
                LIMIT $2
                "#,
                &[&owner, &limit],
            )
            .await?;
        rows.iter().map(VitalsRecord::try_from).collect()
    }
}
