//! Entity operations on [`ApiClient`](crate::transport::ApiClient).
//!
//! Each module owns the backend DTOs for its entity and their mapping into
//! the UI types from `oa_core`.

pub mod auth;
pub mod dashboard;
pub mod departments;
pub mod meetings;
pub mod notifications;
pub mod users;
pub mod workflows;
