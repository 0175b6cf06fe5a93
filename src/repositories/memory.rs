//! Process-local stores used with `APP_STORAGE=memory` and in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    error::{PersistenceError, Result},
    models::{record::VitalsRecord, session::Session},
    repositories::{record::RecordStore, session::SessionStore},
};

/// Records grouped by owner; a query only ever touches its owner's bucket.
#[derive(Default)]
pub struct MemoryRecordStore {
    buckets: Mutex<HashMap<String, Vec<(u64, VitalsRecord)>>>,
    seq: AtomicU64,
    inserts: AtomicU64,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful inserts since creation.
    pub fn insert_count(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: &VitalsRecord) -> std::result::Result<(), PersistenceError> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.buckets
            .lock()
            .await
            .entry(record.owner_uid.clone())
            .or_default()
            .push((seq, record.clone()));
        self.inserts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn query(
        &self,
        owner: &str,
        limit: Option<usize>,
    ) -> std::result::Result<Vec<VitalsRecord>, PersistenceError> {
        let buckets = self.buckets.lock().await;
        let Some(bucket) = buckets.get(owner) else {
            return Ok(Vec::new());
        };

        let mut ordered: Vec<&(u64, VitalsRecord)> = bucket.iter().collect();
        ordered.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at.cmp(&a.created_at).then(b_seq.cmp(a_seq))
        });

        Ok(ordered
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|(_, record)| record.clone())
            .collect())
    }
}

struct Expiring<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Expiring<T> {
    fn new(value: T, ttl_secs: u64) -> Self {
        Self {
            value,
            expires_at: Instant::now() + Duration::from_secs(ttl_secs),
        }
    }

    fn live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// `SessionStore` that keeps sessions, CSRF tokens and attempt counters in
/// maps with per-entry expiry. Expired entries are pruned whenever their map
/// is written.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<Uuid, Expiring<Session>>>,
    csrf: Mutex<HashMap<String, Expiring<()>>>,
    attempts: Mutex<HashMap<String, Expiring<u64>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions held, expired or not.
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Number of CSRF tokens held, expired or not.
    pub async fn csrf_count(&self) -> usize {
        self.csrf.lock().await.len()
    }
}

fn prune<K, T>(entries: &mut HashMap<K, Expiring<T>>) {
    entries.retain(|_, entry| entry.live());
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put_session(&self, session_id: Uuid, session: &Session, ttl_secs: u64) -> Result<()> {
        let mut sessions = self.sessions.lock().await;
        prune(&mut *sessions);
        sessions.insert(session_id, Expiring::new(session.clone(), ttl_secs));
        Ok(())
    }

    async fn get_session(&self, session_id: Uuid) -> Result<Option<Session>> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(&session_id) {
            Some(entry) if entry.live() => Ok(Some(entry.value.clone())),
            Some(_) => {
                sessions.remove(&session_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete_session(&self, session_id: Uuid) -> Result<()> {
        self.sessions.lock().await.remove(&session_id);
        Ok(())
    }

    async fn put_csrf(&self, token: &str, ttl_secs: u64) -> Result<()> {
        let mut csrf = self.csrf.lock().await;
        prune(&mut *csrf);
        csrf.insert(token.to_string(), Expiring::new((), ttl_secs));
        Ok(())
    }

    async fn csrf_is_valid(&self, token: &str) -> Result<bool> {
        Ok(self
            .csrf
            .lock()
            .await
            .get(token)
            .is_some_and(|entry| entry.live()))
    }

    async fn delete_csrf(&self, token: &str) -> Result<()> {
        self.csrf.lock().await.remove(token);
        Ok(())
    }

    async fn record_attempt(&self, key: &str, window_secs: u64) -> Result<u64> {
        let mut attempts = self.attempts.lock().await;
        prune(&mut *attempts);
        let entry = attempts
            .entry(key.to_string())
            .or_insert_with(|| Expiring::new(0, window_secs));
        if !entry.live() {
            *entry = Expiring::new(0, window_secs);
        }
        entry.value += 1;
        Ok(entry.value)
    }
}
