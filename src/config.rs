use std::env;
use std::net::SocketAddr;
use anyhow::{Context, Result};

/// The default Google endpoint used to verify ID tokens.
pub const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Where records and sessions are kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    /// PostgreSQL for records, Redis for sessions.
    Persistent,
    /// Process-local maps; everything is lost on restart.
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "persistent" | "postgres" => Ok(StorageBackend::Persistent),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("APP_STORAGE must be 'persistent' or 'memory', got '{}'", other),
        }
    }
}

/// The application's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// The address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Which storage backends to use.
    pub storage: StorageBackend,
    /// The URL of the PostgreSQL database.
    pub database_url: Option<String>,
    /// The URL of the Redis server.
    pub redis_url: String,
    /// Base URL of the inference service exposing `POST /predict`.
    pub inference_url: String,
    /// OAuth client id the identity tokens must be issued for.
    pub identity_client_id: String,
    /// Token verification endpoint of the identity provider.
    pub identity_tokeninfo_url: String,
    /// How long a session stays valid, in hours.
    pub session_ttl_hours: i64,
    /// Whether cookies are marked `Secure`.
    pub secure_cookies: bool,
    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let storage: StorageBackend = env::var("APP_STORAGE")
            .unwrap_or_else(|_| "persistent".to_string())
            .parse()?;

        let database_url = env::var("DATABASE_URL").ok();
        if storage == StorageBackend::Persistent && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when APP_STORAGE=persistent");
        }

        Ok(Self {
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
                .parse()
                .context("Invalid BIND_ADDR")?,
            storage,
            database_url,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            inference_url: env::var("INFERENCE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string()),
            identity_client_id: env::var("IDENTITY_CLIENT_ID")
                .context("IDENTITY_CLIENT_ID must be set (OAuth client id of the sign-in button)")?,
            identity_tokeninfo_url: env::var("IDENTITY_TOKENINFO_URL")
                .unwrap_or_else(|_| DEFAULT_TOKENINFO_URL.to_string()),
            session_ttl_hours: parse_session_ttl_hours(
                &env::var("SESSION_TTL_HOURS").unwrap_or_else(|_| "12".to_string()),
            )?,
            secure_cookies: env::var("APP_ENV")
                .unwrap_or_else(|_| "development".to_string())
                == "production",
            cors_origins: parse_origins(
                &env::var("CORS_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string()),
            ),
        })
    }

    /// A configuration suitable for running everything in memory.
    pub fn in_memory(identity_client_id: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            storage: StorageBackend::Memory,
            database_url: None,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            inference_url: "http://127.0.0.1:8000".to_string(),
            identity_client_id: identity_client_id.into(),
            identity_tokeninfo_url: DEFAULT_TOKENINFO_URL.to_string(),
            session_ttl_hours: 12,
            secure_cookies: false,
            cors_origins: parse_origins("http://localhost:3000"),
        }
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.session_ttl_hours).unwrap_or(chrono::Duration::MAX)
    }
}

/// Longest session lifetime accepted, one year.
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

fn parse_session_ttl_hours(raw: &str) -> Result<i64> {
    let hours: i64 = raw.trim().parse().context("Invalid SESSION_TTL_HOURS")?;
    if !(1..=MAX_SESSION_TTL_HOURS).contains(&hours) {
        anyhow::bail!(
            "SESSION_TTL_HOURS must be between 1 and {}, got {}",
            MAX_SESSION_TTL_HOURS,
            hours
        );
    }
    Ok(hours)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
