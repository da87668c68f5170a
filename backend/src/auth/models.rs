//! Data structures for authenticated callers.

use crate::utils::jwt::Claims;

/// The signed-in user making a request, as seen by the services.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
    pub email: Option<String>,
    /// Delegated GitHub token, present once the user linked their account.
    pub provider_token: Option<String>,
}

impl From<Claims> for Caller {
    fn from(claims: Claims) -> Self {
        let provider_token = claims
            .provider_token
            .filter(|token| !token.trim().is_empty());
        Self {
            user_id: claims.sub,
            email: claims.email,
            provider_token,
        }
    }
}
