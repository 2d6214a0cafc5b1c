//! Domain types shared by the OA console client.
//!
//! Everything in this crate is UI-facing: the shapes that page loaders and
//! views consume after the API layer has normalized backend DTOs. No I/O
//! happens here.

pub mod dashboard;
pub mod department;
pub mod error;
pub mod meeting;
pub mod notification;
pub mod page;
pub mod roles;
pub mod text;
pub mod types;
pub mod user;
pub mod workflow;
