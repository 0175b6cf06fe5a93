//! Identity provider boundary.
//!
//! The browser obtains an ID token from the provider's sign-in popup and hands
//! it to us; the provider tells us who it belongs to.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{error::AuthError, models::session::Principal};

/// Resolves a sign-in credential to the principal it was issued for.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<Principal, AuthError>;
}

/// Verifies Google ID tokens through the tokeninfo endpoint.
#[derive(Clone)]
pub struct GoogleIdentityProvider {
    client: Client,
    tokeninfo_url: String,
    client_id: String,
}

#[derive(Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct TokenInfoError {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl GoogleIdentityProvider {
    pub fn new(tokeninfo_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            tokeninfo_url: tokeninfo_url.into(),
            client_id: client_id.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    async fn verify(&self, credential: &str) -> Result<Principal, AuthError> {
        let response = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", credential)])
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let reason = response
                .json::<TokenInfoError>()
                .await
                .ok()
                .and_then(|e| e.error_description.or(e.error))
                .unwrap_or_else(|| format!("identity provider returned {}", status));
            return Err(AuthError::Rejected(reason));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| AuthError::Unavailable(format!("unreadable token info: {}", e)))?;

        if info.aud != self.client_id {
            return Err(AuthError::Rejected(
                "credential was issued for a different application".to_string(),
            ));
        }

        let display_name = info
            .name
            .or(info.email)
            .unwrap_or_else(|| info.sub.clone());

        tracing::debug!("🔐 Identity verified for subject {}", info.sub);

        Ok(Principal {
            uid: info.sub,
            display_name,
        })
    }
}
