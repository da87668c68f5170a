//! Service layer.
//!
//! Services are built per request from the shared [`context::AppContext`]
//! and hold the business rules; handlers only translate HTTP in and out.

pub mod authorization_service;
pub mod context;
pub mod contribution_service;
pub mod email_service;
pub mod github_service;
pub mod invite_service;
pub mod team_service;
