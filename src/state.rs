use std::sync::Arc;

use crate::config::{Config, StorageBackend};
use crate::error::Result;
use crate::repositories::{
    memory::{MemoryRecordStore, MemorySessionStore},
    record::{PgRecordStore, RecordStore},
    session::{RedisSessionStore, SessionStore},
};
use crate::services::{
    analysis::{HttpInferenceClient, InferenceClient},
    history_board::HistoryBoard,
    identity::{GoogleIdentityProvider, IdentityProvider},
    submit_control::SubmitControls,
};

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Arc<Config>,
    /// Per-owner vitals records.
    pub records: Arc<dyn RecordStore>,
    /// Sessions, CSRF tokens and attempt counters.
    pub sessions: Arc<dyn SessionStore>,
    /// Verifies sign-in credentials.
    pub identity: Arc<dyn IdentityProvider>,
    /// The inference endpoint.
    pub inference: Arc<dyn InferenceClient>,
    /// The history list currently displayed for each owner.
    pub board: Arc<HistoryBoard>,
    /// The analyze button state for each owner.
    pub submit_controls: SubmitControls,
}

impl AppState {
    /// Creates a new `AppState`, connecting to the configured backends.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let (records, sessions): (Arc<dyn RecordStore>, Arc<dyn SessionStore>) =
            match (config.storage, config.database_url.as_deref()) {
                (StorageBackend::Persistent, Some(database_url)) => {
                    let pool = crate::db::create_pool(database_url)?;
                    crate::db::ensure_schema(&pool).await?;
                    tracing::info!("✅ PostgreSQL pool initialized with deadpool-postgres");

                    let sessions = RedisSessionStore::connect(&config.redis_url).await?;
                    tracing::info!("✅ Redis connection manager initialized");

                    (Arc::new(PgRecordStore::new(pool)), Arc::new(sessions))
                }
                _ => {
                    tracing::warn!("⚠️ Using in-memory storage; records are lost on restart");
                    (
                        Arc::new(MemoryRecordStore::new()),
                        Arc::new(MemorySessionStore::new()),
                    )
                }
            };

        let identity = GoogleIdentityProvider::new(
            config.identity_tokeninfo_url.clone(),
            config.identity_client_id.clone(),
        );
        tracing::info!("✅ Identity provider: {}", config.identity_tokeninfo_url);

        let inference = HttpInferenceClient::new(&config.inference_url);
        tracing::info!("✅ Inference endpoint: {}/predict", config.inference_url);

        Ok(Self::from_parts(
            config.clone(),
            records,
            sessions,
            Arc::new(identity),
            Arc::new(inference),
        ))
    }

    /// Assembles a state from already constructed collaborators.
    pub fn from_parts(
        config: Config,
        records: Arc<dyn RecordStore>,
        sessions: Arc<dyn SessionStore>,
        identity: Arc<dyn IdentityProvider>,
        inference: Arc<dyn InferenceClient>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            records,
            sessions,
            identity,
            inference,
            board: Arc::new(HistoryBoard::new()),
            submit_controls: SubmitControls::new(),
        }
    }
}
