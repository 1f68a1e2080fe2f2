//! Middleware and extractors.

pub mod auth;

pub use auth::RequireAdminKey;
