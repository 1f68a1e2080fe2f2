//! Authentication extractor for the admin API.
//!
//! Admin endpoints require the shared secret in the `x-admin-key` header.
//! Webhook endpoints authenticate via HMAC signature instead and do not use
//! this extractor.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use secrecy::ExposeSecret;
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the admin shared secret.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Extractor that requires a valid admin key.
///
/// Rejects with 401 when the header is absent or does not match the
/// configured `ADMIN_API_KEY`. The comparison is constant-time.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(_admin: RequireAdminKey) -> impl IntoResponse {
///     // only reached with a valid x-admin-key header
/// }
/// ```
pub struct RequireAdminKey;

impl<S> FromRequestParts<S> for RequireAdminKey
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let supplied = parts
            .headers
            .get(ADMIN_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let expected = state.config().admin_api_key.expose_secret();

        // subtle's slice ct_eq returns false on length mismatch without
        // leaking where the bytes differ.
        if !bool::from(supplied.as_bytes().ct_eq(expected.as_bytes())) {
            return Err(AppError::Unauthorized("invalid admin key".to_string()));
        }
        Ok(Self)
    }
}
