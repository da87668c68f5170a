//! Defines the HTTP routes for team settings and contribution listings.

use super::handlers::{get_team_contributions, update_team_repository};
use crate::api::common::preflight;
use crate::auth::middleware::optional_jwt_auth;
use axum::{
    Router, middleware,
    routing::{get, put},
};

pub fn team_router() -> Router {
    Router::new()
        .route(
            "/{team_id}/repository",
            put(update_team_repository)
                .layer(middleware::from_fn(optional_jwt_auth))
                .options(preflight),
        )
        .route(
            "/{team_id}/contributions",
            get(get_team_contributions)
                .layer(middleware::from_fn(optional_jwt_auth))
                .options(preflight),
        )
}
