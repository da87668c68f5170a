//! Module for data access.
//!
//! Each repository is a trait describing one storage concern, with a SQLite
//! implementation next to it. `in_memory` implements all of them on a single
//! in-process store.

pub mod contribution_repository;
pub mod in_memory;
pub mod member_repository;
pub mod team_repository;
pub mod user_repository;
