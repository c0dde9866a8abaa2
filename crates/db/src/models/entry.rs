//! Queue entry model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crowdqueue_core::entry::{normalize_thumbnail, normalize_title, EntryState};
use crowdqueue_core::error::CoreError;
use crowdqueue_core::ranking::Rankable;
use crowdqueue_core::source::{parse_media_url, SourceRef};
use crowdqueue_core::types::{DbId, Timestamp};

/// A row from the `entries` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Entry {
    pub id: DbId,
    pub playlist_id: String,
    pub provider: String,
    pub external_id: String,
    pub url: String,
    pub title: String,
    pub thumbnail_ref: String,
    pub vote_count: i64,
    #[sqlx(rename = "state_id", try_from = "i16")]
    pub state: EntryState,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl Rankable for Entry {
    fn rank_id(&self) -> DbId {
        self.id
    }

    fn rank_votes(&self) -> i64 {
        self.vote_count
    }

    fn rank_created_at(&self) -> Timestamp {
        self.created_at
    }

    fn rank_state(&self) -> EntryState {
        self.state
    }
}

/// A resolved entry ready to be stored.
///
/// The source reference is parsed from the URL here; title and thumbnail are
/// whatever the metadata resolver produced.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub source: SourceRef,
    pub url: String,
    pub title: String,
    pub thumbnail_ref: String,
}

impl NewEntry {
    pub fn from_url(
        url: &str,
        title: Option<&str>,
        thumbnail_ref: Option<&str>,
    ) -> Result<Self, CoreError> {
        let source = parse_media_url(url)?;
        Ok(Self {
            source,
            url: url.trim().to_string(),
            title: normalize_title(title),
            thumbnail_ref: normalize_thumbnail(thumbnail_ref),
        })
    }
}

/// Filters for listing a playlist's entries.
#[derive(Debug, Default, Deserialize)]
pub struct EntryListQuery {
    pub state: Option<EntryState>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
