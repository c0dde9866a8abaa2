//! Handlers scoped to a single entry: lookup, votes, and finishing playback.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use crowdqueue_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/entries/{entry_id}
pub async fn get_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let entry = state.engine.entry(entry_id).await?;
    Ok(Json(DataResponse { data: entry }))
}

/// POST /api/v1/entries/{entry_id}/upvote
///
/// Returns the entry with its updated vote count. A repeat upvote by the same
/// caller is rejected with `ALREADY_VOTED` and leaves the count unchanged.
pub async fn upvote(
    State(state): State<AppState>,
    user: AuthUser,
    Path(entry_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let entry = state.engine.upvote(&user.user_id, entry_id).await?;
    Ok(Json(DataResponse { data: entry }))
}

/// POST /api/v1/entries/{entry_id}/downvote
///
/// Withdraws the caller's upvote. Fails with `NO_SUCH_VOTE` if there is none.
pub async fn downvote(
    State(state): State<AppState>,
    user: AuthUser,
    Path(entry_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let entry = state.engine.downvote(&user.user_id, entry_id).await?;
    Ok(Json(DataResponse { data: entry }))
}

/// POST /api/v1/entries/{entry_id}/finish
///
/// Mark a playing entry as played.
pub async fn finish(
    State(state): State<AppState>,
    user: AuthUser,
    Path(entry_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    tracing::debug!(entry_id, user_id = %user.user_id, "Finish requested");
    let entry = state.selector.finish(entry_id).await?;
    Ok(Json(DataResponse { data: entry }))
}

/// GET /api/v1/entries/{entry_id}/audit
///
/// Cached count next to the ledger count for one entry.
pub async fn audit_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tally = state.engine.audit_entry(entry_id).await?;
    Ok(Json(DataResponse { data: tally }))
}
