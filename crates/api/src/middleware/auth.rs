//! Caller identity extractor for Axum handlers.
//!
//! Authentication happens upstream. The gateway in front of this service
//! forwards the authenticated user id in the `X-User-Id` header, which is
//! trusted as-is once it passes basic shape checks.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use crowdqueue_core::error::CoreError;
use crowdqueue_core::validation::validate_user_id;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the caller's opaque user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity extracted from the `X-User-Id` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Missing X-User-Id header".into()))
            })?;

        validate_user_id(raw).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Malformed X-User-Id header".into()))
        })?;

        Ok(AuthUser {
            user_id: raw.to_string(),
        })
    }
}
