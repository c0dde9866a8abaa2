//! Entry lifecycle: the `Queued -> Playing -> Played` state machine and the
//! descriptive-metadata defaults applied at creation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// State ID type matching SMALLINT in the `entry_states` lookup table.
pub type StateId = i16;

/// Lifecycle state of a queue entry.
///
/// Discriminants match the seed rows of the `entry_states` table.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    Queued = 1,
    Playing = 2,
    Played = 3,
}

impl EntryState {
    /// Return the database state ID.
    pub fn id(self) -> StateId {
        self as StateId
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryState::Queued => "queued",
            EntryState::Playing => "playing",
            EntryState::Played => "played",
        }
    }

    /// Whether `self -> next` is a legal edge. `Played` is terminal and no
    /// edge leads back to `Queued`.
    pub fn can_transition_to(self, next: EntryState) -> bool {
        matches!(
            (self, next),
            (EntryState::Queued, EntryState::Playing) | (EntryState::Playing, EntryState::Played)
        )
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<StateId> for EntryState {
    type Error = CoreError;

    fn try_from(value: StateId) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(EntryState::Queued),
            2 => Ok(EntryState::Playing),
            3 => Ok(EntryState::Played),
            other => Err(CoreError::InvariantViolation(format!(
                "Unknown entry state id {other}"
            ))),
        }
    }
}

impl FromStr for EntryState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(EntryState::Queued),
            "playing" => Ok(EntryState::Playing),
            "played" => Ok(EntryState::Played),
            other => Err(CoreError::Validation(format!(
                "Invalid entry state '{other}'. Must be one of: queued, playing, played"
            ))),
        }
    }
}

/// Check a requested state change for `entry_id`.
pub fn validate_transition(
    entry_id: DbId,
    from: EntryState,
    to: EntryState,
) -> Result<(), CoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition { entry_id, from, to })
    }
}

// ---------------------------------------------------------------------------
// Descriptive metadata
// ---------------------------------------------------------------------------

/// Title stored when the metadata resolver could not provide one.
pub const DEFAULT_TITLE: &str = "Unknown Title";

/// Maximum stored title length in characters.
pub const MAX_TITLE_LEN: usize = 300;

/// Trim the supplied title, falling back to [`DEFAULT_TITLE`] when absent or
/// blank. Overlong titles are truncated on a character boundary.
pub fn normalize_title(title: Option<&str>) -> String {
    match title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => t.chars().take(MAX_TITLE_LEN).collect(),
        None => DEFAULT_TITLE.to_string(),
    }
}

/// Thumbnails are optional; a missing one is stored as the empty string.
pub fn normalize_thumbnail(thumbnail_ref: Option<&str>) -> String {
    thumbnail_ref.map(str::trim).unwrap_or_default().to_string()
}
