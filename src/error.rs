use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures reported by the identity provider during sign-in.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The provider rejected the credential.
    #[error("{0}")]
    Rejected(String),

    /// The provider could not be reached.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Failures of the record store, on both reads and writes.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// A write was attempted without a signed-in user.
    #[error("no active session")]
    NoActiveSession,

    /// The record belongs to someone other than the signed-in user.
    #[error("record owner does not match the signed-in user")]
    OwnerMismatch,

    /// A PostgreSQL error.
    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// The connection pool could not hand out a client.
    #[error("pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A column was missing or had an unexpected type.
    #[error("missing data: {0}")]
    MissingData(String),
}

/// Failures while calling the inference endpoint.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The request never produced a response.
    #[error("{0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("inference endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not `{"analysis": "..."}`.
    #[error("invalid inference response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AnalysisError::Decode(e.to_string())
        } else {
            AnalysisError::Transport(e.to_string())
        }
    }
}

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Sign-in failed.
    #[error("Login Failed: {0}")]
    Auth(#[from] AuthError),

    /// The record store rejected a read or a write.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// The owner's records could not be read back for display.
    #[error("Records unavailable: {0}")]
    RecordsUnavailable(PersistenceError),

    /// The inference call failed.
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// A Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// No valid session or CSRF token accompanied the request.
    #[error("Authorization failed: {0}")]
    Unauthorized(String),

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),

    /// A rate limit exceeded error.
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// The message shown to the user in the blocking alert.
    pub fn alert_message(&self) -> String {
        match self {
            AppError::Auth(e) => format!("Login Failed: {}", e),
            AppError::Analysis(e) => format!("Error connecting to AI: {}", e),
            AppError::Persistence(e) => format!("Error connecting to AI: {}", e),
            AppError::RecordsUnavailable(e) => format!("Could not load your records: {}", e),
            AppError::Redis(_) => "Session storage unavailable".to_string(),
            AppError::Unauthorized(msg)
            | AppError::Validation(msg)
            | AppError::RateLimitExceeded(msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(AuthError::Rejected(_)) => StatusCode::UNAUTHORIZED,
            AppError::Auth(AuthError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
            AppError::Persistence(PersistenceError::NoActiveSession) => StatusCode::UNAUTHORIZED,
            AppError::Persistence(PersistenceError::OwnerMismatch) => StatusCode::FORBIDDEN,
            AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::RecordsUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Analysis(_) => StatusCode::BAD_GATEWAY,
            AppError::Redis(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::Auth(e) => tracing::warn!("Sign-in failed: {}", e),
            AppError::Persistence(e) => tracing::error!("Record store error: {}", e),
            AppError::RecordsUnavailable(e) => tracing::error!("Record read failed: {}", e),
            AppError::Analysis(e) => tracing::error!("Inference call failed: {}", e),
            AppError::Redis(e) => tracing::error!("Redis error: {}", e),
            AppError::Unauthorized(msg) => tracing::warn!("Authorization failed: {}", msg),
            AppError::Validation(msg) => tracing::debug!("Validation error: {}", msg),
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            AppError::RateLimitExceeded(msg) => tracing::warn!("Rate limit exceeded: {}", msg),
        }

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": self.alert_message()
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (
            status,
            [(http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_failures_read_as_connection_errors() {
        let err = AppError::from(AnalysisError::Status {
            status: 500,
            body: "boom".into(),
        });
        assert_eq!(
            err.alert_message(),
            "Error connecting to AI: inference endpoint returned 500: boom"
        );
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn read_failures_do_not_mention_the_ai() {
        let err = AppError::RecordsUnavailable(PersistenceError::MissingData("read down".into()));
        assert_eq!(
            err.alert_message(),
            "Could not load your records: missing data: read down"
        );
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn rejected_sign_in_is_unauthorized() {
        let err = AppError::from(AuthError::Rejected("popup closed".into()));
        assert_eq!(err.alert_message(), "Login Failed: popup closed");
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
