pub mod entries;
pub mod health;
pub mod playlists;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /playlists/{playlist_id}/entries                 list, submit
/// /playlists/{playlist_id}/queue                   ranked queue
/// /playlists/{playlist_id}/now-playing             current entry
/// /playlists/{playlist_id}/advance                 start next (POST)
/// /playlists/{playlist_id}/votes                   caller's votes
/// /playlists/{playlist_id}/audit                   drifting tallies
///
/// /entries/{entry_id}                              get
/// /entries/{entry_id}/upvote                       upvote (POST)
/// /entries/{entry_id}/downvote                     withdraw upvote (POST)
/// /entries/{entry_id}/finish                       mark played (POST)
/// /entries/{entry_id}/audit                        tally
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/playlists", playlists::router())
        .nest("/entries", entries::router())
}
