//! Middleware for resolving the caller from the bearer token.
//!
//! Requests without a valid token are not rejected here: the resolved
//! `Option<Caller>` is stored in the request extensions and each service
//! decides when a missing caller is an authentication error, so that input
//! validation runs first.

use crate::auth::models::Caller;
use crate::services::context::AppContext;
use axum::{
    extract::Request,
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

/// Extracts the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth_header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = auth_header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Optional JWT authentication middleware (doesn't fail if no token)
pub async fn optional_jwt_auth(mut request: Request, next: Next) -> Response {
    let caller: Option<Caller> = {
        let ctx = request.extensions().get::<AppContext>();
        match (bearer_token(request.headers()), ctx) {
            (Some(token), Some(ctx)) => match ctx.jwt.validate_token(token) {
                Ok(claims) => Some(claims.into()),
                Err(e) => {
                    tracing::debug!("Rejected bearer token: {}", e);
                    None
                }
            },
            (Some(_), None) => {
                tracing::error!("Application context missing from request extensions");
                None
            }
            (None, _) => None,
        }
    };

    // Always insert the Option<Caller>, even if it's None
    request.extensions_mut().insert(caller);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers_with("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("Basic abc")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
