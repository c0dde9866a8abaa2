//! Handlers scoped to a playlist: submission, listings, and playback.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crowdqueue_core::validation::validate_playlist_id;
use crowdqueue_db::models::entry::{EntryListQuery, NewEntry};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /playlists/{playlist_id}/entries`.
///
/// `title` and `thumbnail_ref` are whatever the client-side metadata lookup
/// produced; both are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEntryRequest {
    #[validate(length(min = 1, max = 2048))]
    pub url: String,
    #[validate(length(max = 300))]
    pub title: Option<String>,
    #[validate(length(max = 2048))]
    pub thumbnail_ref: Option<String>,
}

fn validated_playlist(playlist_id: &str) -> AppResult<()> {
    validate_playlist_id(playlist_id)?;
    Ok(())
}

/// POST /api/v1/playlists/{playlist_id}/entries
///
/// Submit a media URL to the playlist. The entry starts `queued` with zero
/// votes; the submitter does not get an implicit vote.
pub async fn create_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Path(playlist_id): Path<String>,
    Json(input): Json<CreateEntryRequest>,
) -> AppResult<impl IntoResponse> {
    validated_playlist(&playlist_id)?;
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let new_entry = NewEntry::from_url(
        &input.url,
        input.title.as_deref(),
        input.thumbnail_ref.as_deref(),
    )?;
    let entry = state.engine.enqueue(&playlist_id, &new_entry).await?;

    tracing::info!(
        entry_id = entry.id,
        playlist_id = %playlist_id,
        source = %new_entry.source,
        user_id = %user.user_id,
        "Entry submitted",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: entry })))
}

/// GET /api/v1/playlists/{playlist_id}/entries?state=&limit=&offset=
pub async fn list_entries(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    Query(params): Query<EntryListQuery>,
) -> AppResult<impl IntoResponse> {
    validated_playlist(&playlist_id)?;
    let entries = state.engine.entries(&playlist_id, &params).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// GET /api/v1/playlists/{playlist_id}/queue
///
/// Queued entries in play order.
pub async fn get_queue(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    validated_playlist(&playlist_id)?;
    let queue = state.engine.ranked_queue(&playlist_id).await?;
    Ok(Json(DataResponse { data: queue }))
}

/// GET /api/v1/playlists/{playlist_id}/now-playing
///
/// `data` is `null` when nothing is playing.
pub async fn now_playing(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    validated_playlist(&playlist_id)?;
    let entry = state.selector.now_playing(&playlist_id).await?;
    Ok(Json(DataResponse { data: entry }))
}

/// POST /api/v1/playlists/{playlist_id}/advance
///
/// Start the top-ranked queued entry. Fails with `EMPTY_QUEUE` when nothing
/// is queued.
pub async fn advance(
    State(state): State<AppState>,
    user: AuthUser,
    Path(playlist_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    validated_playlist(&playlist_id)?;
    let entry = state.selector.advance(&playlist_id).await?;

    tracing::info!(
        entry_id = entry.id,
        playlist_id = %playlist_id,
        user_id = %user.user_id,
        "Playlist advanced",
    );

    Ok(Json(DataResponse { data: entry }))
}

/// GET /api/v1/playlists/{playlist_id}/votes
///
/// Ids of the caller's currently-upvoted entries in this playlist.
pub async fn my_votes(
    State(state): State<AppState>,
    user: AuthUser,
    Path(playlist_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    validated_playlist(&playlist_id)?;
    let ids = state
        .engine
        .voted_entry_ids(&user.user_id, &playlist_id)
        .await?;
    Ok(Json(DataResponse { data: ids }))
}

/// GET /api/v1/playlists/{playlist_id}/audit
///
/// Entries whose cached vote count disagrees with the ledger. Empty when
/// everything reconciles.
pub async fn audit_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    validated_playlist(&playlist_id)?;
    let drifting = state.engine.audit_playlist(&playlist_id).await?;
    Ok(Json(DataResponse { data: drifting }))
}
