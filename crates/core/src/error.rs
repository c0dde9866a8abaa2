use crate::entry::EntryState;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Source {source_ref} is already active in playlist {playlist_id}")]
    DuplicateSource {
        playlist_id: String,
        source_ref: String,
    },

    #[error("User {user_id} has already voted for entry {entry_id}")]
    AlreadyVoted { user_id: String, entry_id: DbId },

    #[error("User {user_id} has no vote on entry {entry_id}")]
    NoSuchVote { user_id: String, entry_id: DbId },

    #[error("Entry {entry_id} cannot move from {from} to {to}")]
    InvalidTransition {
        entry_id: DbId,
        from: EntryState,
        to: EntryState,
    },

    #[error("Playlist {playlist_id} has no queued entries")]
    EmptyQueue { playlist_id: String },

    /// Internal consistency failure. Always a bug upstream, never clamped.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}
