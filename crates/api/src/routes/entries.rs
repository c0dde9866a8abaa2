//! Route definitions for single-entry operations.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::entries;
use crate::state::AppState;

/// Routes mounted at `/entries`.
///
/// ```text
/// GET  /{entry_id}           -> get_entry
/// POST /{entry_id}/upvote    -> upvote
/// POST /{entry_id}/downvote  -> downvote
/// POST /{entry_id}/finish    -> finish
/// GET  /{entry_id}/audit     -> audit_entry
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{entry_id}", get(entries::get_entry))
        .route("/{entry_id}/upvote", post(entries::upvote))
        .route("/{entry_id}/downvote", post(entries::downvote))
        .route("/{entry_id}/finish", post(entries::finish))
        .route("/{entry_id}/audit", get(entries::audit_entry))
}
