use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable subject identifier issued by the identity provider.
    pub uid: String,
    /// Human readable name shown in the dashboard header.
    pub display_name: String,
}

/// Represents a signed-in browser session.
///
/// Sessions live only in the session store and expire on their own; the
/// cookie that points at them carries no max-age, so closing the browser
/// ends the session as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The principal this session belongs to.
    pub principal: Principal,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session for `principal` that lives for `ttl`. A `ttl` past
    /// the representable range saturates at the latest instant.
    pub fn new(principal: Principal, ttl: chrono::Duration) -> Self {
        let now = Utc::now();
        Self {
            principal,
            created_at: now,
            expires_at: now
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Shorthand for the owner identifier used to scope records.
    pub fn owner(&self) -> &str {
        &self.principal.uid
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}
