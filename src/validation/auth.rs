use garde::Validate;
use serde::Deserialize;

use crate::error::{AppError, Result};

/// The request payload for signing in with an identity provider token.
#[derive(Deserialize, Validate)]
pub struct SignInRequest {
    /// The ID token returned by the provider's sign-in popup.
    #[garde(length(min = 1, max = 4096))]
    pub credential: String,
}

impl std::fmt::Debug for SignInRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInRequest")
            .field("credential", &"<redacted>")
            .finish()
    }
}

/// Validates a sign-in payload.
///
/// # Arguments
///
/// * `request` - The payload to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the payload is acceptable.
pub fn validate_sign_in(request: &SignInRequest) -> Result<()> {
    request
        .validate()
        .map_err(|report| AppError::Validation(format!("Invalid sign-in request: {}", report)))
}
