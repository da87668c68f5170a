//! Authentication module for resolving the caller behind a request.
//!
//! This module provides the bearer-token middleware and the caller identity
//! handed to services. Token issuance belongs to the identity provider.

pub mod middleware;
pub mod models;
