//! JWT token utilities for authentication.
//!
//! Validates the session tokens presented as bearer credentials. Tokens are
//! minted by the identity provider; only tests sign their own. A session may carry the delegated
//! GitHub token obtained when the user linked their account.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// JWT Claims structure containing the signed-in user's session data
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// User email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Delegated GitHub OAuth token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_token: Option<String>,
    /// Token expiration timestamp
    pub exp: usize,
    /// Token issued at timestamp
    pub iat: usize,
}

/// JWT token utility for validating tokens
pub struct JwtUtils {
    #[cfg(test)]
    encoding_key: jsonwebtoken::EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtUtils {
    /// Create a new JwtUtils instance from the shared HS256 secret
    pub fn new(secret: &str) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // Session tokens from the identity provider carry an audience we do not pin.
        validation.validate_aud = false;

        JwtUtils {
            #[cfg(test)]
            encoding_key: jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
            decoding_key,
            validation,
        }
    }

    /// Signs a session token the way the identity provider does.
    #[cfg(test)]
    pub fn generate_token(
        &self,
        user_id: &str,
        email: Option<&str>,
        provider_token: Option<&str>,
        expires_in_seconds: i64,
    ) -> Result<String, ServiceError> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::seconds(expires_in_seconds);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.map(str::to_string),
            provider_token: provider_token.map(str::to_string),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::validation(format!("Token generation failed: {}", e)))
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| ServiceError::authentication(format!("Token validation failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_keeps_provider_token() {
        let jwt = JwtUtils::new("test-secret");
        let token = jwt
            .generate_token("user-1", Some("a@x.com"), Some("gho_123"), 3600)
            .unwrap();

        let claims = jwt.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email.as_deref(), Some("a@x.com"));
        assert_eq!(claims.provider_token.as_deref(), Some("gho_123"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtUtils::new("one")
            .generate_token("user-1", None, None, 3600)
            .unwrap();
        let err = JwtUtils::new("two").validate_token(&token).unwrap_err();
        assert!(matches!(err, ServiceError::Authentication { .. }));
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = JwtUtils::new("test-secret");
        let token = jwt.generate_token("user-1", None, None, -3600).unwrap();
        assert!(jwt.validate_token(&token).is_err());
    }
}
