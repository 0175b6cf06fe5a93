use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::session::Session,
};

/// Server-side state behind the session and CSRF cookies.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores `session` under `session_id` for `ttl_secs` seconds.
    async fn put_session(&self, session_id: Uuid, session: &Session, ttl_secs: u64) -> Result<()>;

    /// Loads a session, `None` if it does not exist or has been evicted.
    async fn get_session(&self, session_id: Uuid) -> Result<Option<Session>>;

    async fn delete_session(&self, session_id: Uuid) -> Result<()>;

    /// Registers a CSRF token as valid for `ttl_secs` seconds.
    async fn put_csrf(&self, token: &str, ttl_secs: u64) -> Result<()>;

    async fn csrf_is_valid(&self, token: &str) -> Result<bool>;

    async fn delete_csrf(&self, token: &str) -> Result<()>;

    /// Counts one attempt under `key` and returns the count within the
    /// current window of `window_secs` seconds.
    async fn record_attempt(&self, key: &str, window_secs: u64) -> Result<u64>;
}

fn session_key(session_id: Uuid) -> String {
    format!("session:{}", session_id)
}

fn csrf_key(token: &str) -> String {
    format!("csrf:{}", token)
}

/// `SessionStore` backed by Redis.
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: ConnectionManager,
}

impl RedisSessionStore {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;
        Ok(Self { redis })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put_session(&self, session_id: Uuid, session: &Session, ttl_secs: u64) -> Result<()> {
        let session_json = sonic_rs::to_string(session)
            .map_err(|e| AppError::Internal(format!("Session serialization failed: {}", e)))?;

        let _: () = self
            .redis
            .clone()
            .set_ex(session_key(session_id), &session_json, ttl_secs)
            .await
            .map_err(|e| {
                tracing::error!("❌ Redis set_ex failed: {}", e);
                AppError::Redis(e)
            })?;
        Ok(())
    }

    async fn get_session(&self, session_id: Uuid) -> Result<Option<Session>> {
        let session_json: Option<String> = self.redis.clone().get(session_key(session_id)).await?;

        match session_json {
            Some(json) => match sonic_rs::from_str::<Session>(&json) {
                Ok(session) => Ok(Some(session)),
                Err(e) => {
                    tracing::warn!("❌ Invalid session JSON for {}: {}", session_id, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn delete_session(&self, session_id: Uuid) -> Result<()> {
        let _: () = self.redis.clone().del(session_key(session_id)).await?;
        Ok(())
    }

    async fn put_csrf(&self, token: &str, ttl_secs: u64) -> Result<()> {
        let _: () = self
            .redis
            .clone()
            .set_ex(csrf_key(token), "valid", ttl_secs)
            .await
            .map_err(|e| {
                tracing::error!("❌ Redis set_ex failed for CSRF: {}", e);
                AppError::Redis(e)
            })?;
        Ok(())
    }

    async fn csrf_is_valid(&self, token: &str) -> Result<bool> {
        let value: Option<String> = self.redis.clone().get(csrf_key(token)).await?;
        Ok(value.is_some())
    }

    async fn delete_csrf(&self, token: &str) -> Result<()> {
        let _: () = self.redis.clone().del(csrf_key(token)).await?;
        Ok(())
    }

    async fn record_attempt(&self, key: &str, window_secs: u64) -> Result<u64> {
        let mut redis = self.redis.clone();
        let count: u64 = redis.incr(key, 1u64).await?;
        if count == 1 {
            let _: () = redis.expire(key, window_secs as i64).await?;
        }
        Ok(count)
    }
}
