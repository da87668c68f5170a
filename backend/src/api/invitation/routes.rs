//! Defines the HTTP routes for invitation responses.

use super::handlers::respond_to_invitation;
use crate::api::common::preflight;
use crate::auth::middleware::optional_jwt_auth;
use axum::{Router, middleware, routing::post};

pub fn invitation_router() -> Router {
    Router::new().route(
        "/{id}/respond",
        post(respond_to_invitation)
            .layer(middleware::from_fn(optional_jwt_auth))
            .options(preflight),
    )
}
