//! Validation of caller-supplied identifiers.
//!
//! Playlist and user identifiers are opaque strings issued by external
//! collaborators (the creator registry and the authentication gateway). The
//! engine only insists that they are non-blank, bounded, and printable.

use crate::error::CoreError;

/// Maximum length of a playlist or user identifier.
pub const MAX_IDENTIFIER_LEN: usize = 128;

fn validate_identifier(kind: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{kind} is required")));
    }
    if value.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(CoreError::Validation(format!(
            "{kind} must be at most {MAX_IDENTIFIER_LEN} characters"
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(CoreError::Validation(format!(
            "{kind} must not contain control characters"
        )));
    }
    Ok(())
}

pub fn validate_playlist_id(playlist_id: &str) -> Result<(), CoreError> {
    validate_identifier("Playlist ID", playlist_id)
}

pub fn validate_user_id(user_id: &str) -> Result<(), CoreError> {
    validate_identifier("User ID", user_id)
}
