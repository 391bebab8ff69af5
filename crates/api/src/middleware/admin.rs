//! Shared-secret guard for the admin surface.
//!
//! The storefront's user accounts live in an external service; the admin
//! back-office authenticates to this engine with a single shared token in
//! the `x-admin-token` header. Tokens are compared as SHA-256 digests so
//! the comparison does not leak length or prefix timing.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::state::AppState;

/// Extractor that authorizes admin requests.
///
/// Use as a handler parameter:
///
/// ```ignore
/// async fn create_sale(_admin: AdminAuth, ...) -> AppResult<impl IntoResponse> { ... }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("x-admin-token")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing x-admin-token header".into()))?;

        let presented = Sha256::digest(token.as_bytes());
        let expected = Sha256::digest(state.config.admin_api_token.as_bytes());

        if presented != expected {
            return Err(AppError::Unauthorized("Invalid admin token".into()));
        }

        Ok(AdminAuth)
    }
}
