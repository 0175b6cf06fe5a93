use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use crate::error::{AppError, PersistenceError, Result};
use std::time::Duration;

/// DDL for the record collection. Records are immutable, so there are no
/// update triggers or soft-delete columns.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS health_records (
    seq          BIGSERIAL PRIMARY KEY,
    id           UUID NOT NULL UNIQUE,
    owner_uid    TEXT NOT NULL,
    bp_sys       TEXT NOT NULL,
    bp_dia       TEXT NOT NULL,
    glucose      TEXT NOT NULL,
    heart        TEXT NOT NULL,
    chronic      TEXT NOT NULL,
    symptoms     TEXT NOT NULL,
    display_date TEXT NOT NULL,
    created_at   TIMESTAMPTZ NOT NULL,
    ai_analysis  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS health_records_owner_created
    ON health_records (owner_uid, created_at DESC, seq DESC);
"#;

/// Creates a new database connection pool.
///
/// # Arguments
///
/// * `database_url` - The URL of the PostgreSQL database.
///
/// # Returns
///
/// A `Result` containing the `Pool`.
pub fn create_pool(database_url: &str) -> Result<Pool> {
    let mut cfg = Config::new();
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(PersistenceError::from)?;

    if let Some(host) = pg_config.get_hosts().first() {
        if let tokio_postgres::config::Host::Tcp(hostname) = host {
            cfg.host = Some(hostname.to_string());
        }
    }

    if let Some(port) = pg_config.get_ports().first() {
        cfg.port = Some(*port);
    }

    if let Some(dbname) = pg_config.get_dbname() {
        cfg.dbname = Some(dbname.to_string());
    }

    if let Some(user) = pg_config.get_user() {
        cfg.user = Some(user.to_string());
    }

    if let Some(password) = pg_config.get_password() {
        cfg.password = Some(String::from_utf8_lossy(password).to_string());
    }

    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    cfg.pool = Some(PoolConfig {
        max_size: 32,
        timeouts: deadpool_postgres::Timeouts {
            wait: Some(Duration::from_secs(5)),
            create: Some(Duration::from_secs(2)),
            recycle: Some(Duration::from_secs(1)),
        },
        ..Default::default()
    });

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| AppError::Internal(format!("Failed to create pool: {}", e)))
}

/// Creates the record table and its index if they do not exist yet.
pub async fn ensure_schema(pool: &Pool) -> Result<()> {
    let client = pool.get().await.map_err(PersistenceError::from)?;
    client
        .batch_execute(SCHEMA)
        .await
        .map_err(PersistenceError::from)?;
    tracing::info!("✅ health_records schema ready");
    Ok(())
}
