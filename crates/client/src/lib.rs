//! Typed client for the OA console backend.
//!
//! [`ApiClient`](transport::ApiClient) is the single place where backend
//! responses become UI types: it attaches the bearer token, normalizes the
//! two response envelope conventions, and expires the session on 401/403.
//! Entity operations live in [`api`]; the OpenAI-compatible chat panel
//! backend lives in [`chat`].

pub mod api;
pub mod cache;
pub mod chat;
pub mod config;
pub mod envelope;
pub mod error;
pub mod navigator;
pub mod session;
pub mod storage;
pub mod transport;

mod de;

pub use error::ApiError;
pub use session::SessionStore;
pub use transport::ApiClient;
