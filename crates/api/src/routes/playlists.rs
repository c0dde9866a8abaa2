//! Route definitions for playlist-scoped operations.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::playlists;
use crate::state::AppState;

/// Routes mounted at `/playlists`.
///
/// ```text
/// GET  /{playlist_id}/entries      -> list_entries
/// POST /{playlist_id}/entries      -> create_entry
/// GET  /{playlist_id}/queue        -> get_queue
/// GET  /{playlist_id}/now-playing  -> now_playing
/// POST /{playlist_id}/advance      -> advance
/// GET  /{playlist_id}/votes        -> my_votes
/// GET  /{playlist_id}/audit        -> audit_playlist
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{playlist_id}/entries",
            get(playlists::list_entries).post(playlists::create_entry),
        )
        .route("/{playlist_id}/queue", get(playlists::get_queue))
        .route("/{playlist_id}/now-playing", get(playlists::now_playing))
        .route("/{playlist_id}/advance", post(playlists::advance))
        .route("/{playlist_id}/votes", get(playlists::my_votes))
        .route("/{playlist_id}/audit", get(playlists::audit_playlist))
}
