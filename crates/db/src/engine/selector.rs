//! Next-entry selection: promotes the head of the ranked queue to playing.

use sqlx::PgPool;

use crowdqueue_core::entry::EntryState;
use crowdqueue_core::error::CoreError;
use crowdqueue_core::ranking::rank_queue;
use crowdqueue_core::types::DbId;
use crowdqueue_core::validation::validate_playlist_id;

use crate::error::QueueResult;
use crate::models::entry::Entry;
use crate::repositories::EntryRepo;

/// First key of the two-key advisory lock taken by [`NextSelector::advance`].
/// The second key is `hashtext(playlist_id)`.
const ADVANCE_LOCK_NAMESPACE: i32 = 0x4351;

/// Advances playback through a playlist's queue. Cheap to clone.
#[derive(Clone)]
pub struct NextSelector {
    pool: PgPool,
}

impl NextSelector {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Take the top-ranked `Queued` entry and mark it `Playing`.
    ///
    /// Concurrent calls on the same playlist serialize on a transaction-scoped
    /// advisory lock, so no two callers can select the same head. The state
    /// flip is also a compare-and-swap; a lost swap re-reads the queue.
    /// Fails with `EmptyQueue` when nothing is queued.
    pub async fn advance(&self, playlist_id: &str) -> QueueResult<Entry> {
        validate_playlist_id(playlist_id)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1, hashtext($2))")
            .bind(ADVANCE_LOCK_NAMESPACE)
            .bind(playlist_id)
            .execute(&mut *tx)
            .await?;

        loop {
            let active = EntryRepo::list_active(&mut *tx, playlist_id).await?;
            let Some(head) = rank_queue(active).into_iter().next() else {
                tracing::debug!(playlist_id = %playlist_id, "Advance on empty queue");
                return Err(CoreError::EmptyQueue {
                    playlist_id: playlist_id.to_string(),
                }
                .into());
            };

            let claimed =
                EntryRepo::transition_if(&mut *tx, head.id, EntryState::Queued, EntryState::Playing)
                    .await?;

            match claimed {
                Some(entry) => {
                    tx.commit().await?;
                    tracing::info!(
                        playlist_id = %playlist_id,
                        entry_id = entry.id,
                        vote_count = entry.vote_count,
                        "Entry now playing",
                    );
                    return Ok(entry);
                }
                None => {
                    tracing::debug!(
                        playlist_id = %playlist_id,
                        entry_id = head.id,
                        "Head entry left the queue concurrently, re-reading",
                    );
                }
            }
        }
    }

    /// Mark a playing entry as played. Fails with `InvalidTransition` unless
    /// the entry is currently `Playing`.
    pub async fn finish(&self, entry_id: DbId) -> QueueResult<Entry> {
        let mut tx = self.pool.begin().await?;
        let entry = EntryRepo::set_state(&mut *tx, entry_id, EntryState::Played).await?;
        tx.commit().await?;

        tracing::info!(
            playlist_id = %entry.playlist_id,
            entry_id,
            "Entry finished",
        );
        Ok(entry)
    }

    /// The playlist's current `Playing` entry, if any.
    pub async fn now_playing(&self, playlist_id: &str) -> QueueResult<Option<Entry>> {
        validate_playlist_id(playlist_id)?;
        let mut conn = self.pool.acquire().await?;
        EntryRepo::find_playing(&mut *conn, playlist_id).await
    }
}
