//! Defines the HTTP routes for the team functions.
//!
//! Every route resolves the caller with `optional_jwt_auth`; the services
//! decide when a missing caller is an error.

use super::handlers::{github_proxy, send_team_invite, sync_github_contributions, test_email};
use crate::api::common::preflight;
use crate::auth::middleware::optional_jwt_auth;
use axum::{Router, middleware, routing::post};

pub fn functions_router() -> Router {
    Router::new()
        .route(
            "/send-team-invite",
            post(send_team_invite)
                .layer(middleware::from_fn(optional_jwt_auth))
                .options(preflight),
        )
        .route(
            "/sync-github-contributions",
            post(sync_github_contributions)
                .layer(middleware::from_fn(optional_jwt_auth))
                .options(preflight),
        )
        .route(
            "/github-proxy",
            post(github_proxy)
                .layer(middleware::from_fn(optional_jwt_auth))
                .options(preflight),
        )
        .route(
            "/test-email",
            post(test_email)
                .layer(middleware::from_fn(optional_jwt_auth))
                .options(preflight),
        )
}
