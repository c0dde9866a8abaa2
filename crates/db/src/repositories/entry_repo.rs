//! Repository for the `entries` table.

use sqlx::PgConnection;

use crowdqueue_core::entry::{validate_transition, EntryState};
use crowdqueue_core::error::CoreError;
use crowdqueue_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use crowdqueue_core::types::DbId;
use crowdqueue_core::vote::apply_vote_delta;

use crate::error::QueueResult;
use crate::models::entry::{Entry, EntryListQuery, NewEntry};

/// Column list for `entries` queries.
const COLUMNS: &str = "id, playlist_id, provider, external_id, url, title, thumbnail_ref, \
                       vote_count, state_id, created_at, started_at, finished_at, updated_at";

/// Durable store of queue entries.
pub struct EntryRepo;

impl EntryRepo {
    /// Insert a new `Queued` entry with zero votes.
    ///
    /// Uses `INSERT ... ON CONFLICT DO NOTHING` against the partial unique
    /// index on active sources. A no-op insert means the same media is already
    /// queued or playing in this playlist.
    pub async fn create(
        conn: &mut PgConnection,
        playlist_id: &str,
        input: &NewEntry,
    ) -> QueueResult<Entry> {
        let query = format!(
            "INSERT INTO entries \
                 (playlist_id, provider, external_id, url, title, thumbnail_ref, state_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (playlist_id, provider, external_id) WHERE state_id IN (1, 2) \
             DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let entry = sqlx::query_as::<_, Entry>(&query)
            .bind(playlist_id)
            .bind(input.source.provider.as_str())
            .bind(&input.source.external_id)
            .bind(&input.url)
            .bind(&input.title)
            .bind(&input.thumbnail_ref)
            .bind(EntryState::Queued.id())
            .fetch_optional(&mut *conn)
            .await?;

        entry.ok_or_else(|| {
            CoreError::DuplicateSource {
                playlist_id: playlist_id.to_string(),
                source_ref: input.source.to_string(),
            }
            .into()
        })
    }

    /// Find an entry by id.
    pub async fn find_by_id(conn: &mut PgConnection, id: DbId) -> QueueResult<Option<Entry>> {
        let query = format!("SELECT {COLUMNS} FROM entries WHERE id = $1");
        let entry = sqlx::query_as::<_, Entry>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(entry)
    }

    /// Fetch an entry, failing with `NotFound` if it does not exist.
    pub async fn get(conn: &mut PgConnection, id: DbId) -> QueueResult<Entry> {
        Self::find_by_id(conn, id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Fetch an entry and hold its row lock until the surrounding transaction
    /// ends. Concurrent votes on the same entry queue up behind this lock.
    pub async fn lock(conn: &mut PgConnection, id: DbId) -> QueueResult<Entry> {
        let query = format!("SELECT {COLUMNS} FROM entries WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Entry>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// All `Queued` entries of a playlist. Order is unspecified; ranking is
    /// the engine's job.
    pub async fn list_active(
        conn: &mut PgConnection,
        playlist_id: &str,
    ) -> QueueResult<Vec<Entry>> {
        let query = format!(
            "SELECT {COLUMNS} FROM entries \
             WHERE playlist_id = $1 AND state_id = $2"
        );
        let entries = sqlx::query_as::<_, Entry>(&query)
            .bind(playlist_id)
            .bind(EntryState::Queued.id())
            .fetch_all(&mut *conn)
            .await?;
        Ok(entries)
    }

    /// Every entry of a playlist in creation order, optionally filtered by
    /// state, with clamped pagination.
    pub async fn list(
        conn: &mut PgConnection,
        playlist_id: &str,
        params: &EntryListQuery,
    ) -> QueueResult<Vec<Entry>> {
        let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
        let offset = clamp_offset(params.offset);
        let query = format!(
            "SELECT {COLUMNS} FROM entries \
             WHERE playlist_id = $1 AND ($2::SMALLINT IS NULL OR state_id = $2) \
             ORDER BY created_at ASC, id ASC \
             LIMIT $3 OFFSET $4"
        );
        let entries = sqlx::query_as::<_, Entry>(&query)
            .bind(playlist_id)
            .bind(params.state.map(EntryState::id))
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *conn)
            .await?;
        Ok(entries)
    }

    /// The most recently started `Playing` entry of a playlist, if any.
    pub async fn find_playing(
        conn: &mut PgConnection,
        playlist_id: &str,
    ) -> QueueResult<Option<Entry>> {
        let query = format!(
            "SELECT {COLUMNS} FROM entries \
             WHERE playlist_id = $1 AND state_id = $2 \
             ORDER BY started_at DESC NULLS LAST, id DESC \
             LIMIT 1"
        );
        let entry = sqlx::query_as::<_, Entry>(&query)
            .bind(playlist_id)
            .bind(EntryState::Playing.id())
            .fetch_optional(&mut *conn)
            .await?;
        Ok(entry)
    }

    /// Move an entry to `new_state`, enforcing the lifecycle state machine.
    ///
    /// Locks the row first, so the state read and the write cannot interleave
    /// with another transition of the same entry.
    pub async fn set_state(
        conn: &mut PgConnection,
        id: DbId,
        new_state: EntryState,
    ) -> QueueResult<Entry> {
        let current = Self::lock(conn, id).await?;
        validate_transition(id, current.state, new_state)?;
        Self::transition_if(conn, id, current.state, new_state)
            .await?
            .ok_or_else(|| {
                CoreError::InvariantViolation(format!(
                    "entry {id} changed state while locked"
                ))
                .into()
            })
    }

    /// Compare-and-swap on state: flip `from -> to` only if the entry is still
    /// in `from`. Returns `None` when another caller got there first.
    ///
    /// Stamps `started_at` on entering `Playing` and `finished_at` on entering
    /// `Played`.
    pub async fn transition_if(
        conn: &mut PgConnection,
        id: DbId,
        from: EntryState,
        to: EntryState,
    ) -> QueueResult<Option<Entry>> {
        validate_transition(id, from, to)?;
        let query = format!(
            "UPDATE entries SET \
                 state_id = $3, \
                 started_at = CASE WHEN $3 = $4 THEN NOW() ELSE started_at END, \
                 finished_at = CASE WHEN $3 = $5 THEN NOW() ELSE finished_at END, \
                 updated_at = NOW() \
             WHERE id = $1 AND state_id = $2 \
             RETURNING {COLUMNS}"
        );
        let entry = sqlx::query_as::<_, Entry>(&query)
            .bind(id)
            .bind(from.id())
            .bind(to.id())
            .bind(EntryState::Playing.id())
            .bind(EntryState::Played.id())
            .fetch_optional(&mut *conn)
            .await?;
        Ok(entry)
    }

    /// Add `delta` to the cached vote count in place.
    ///
    /// The guard in the `WHERE` clause refuses any update that would leave the
    /// count negative; such a request means the ledger and the counter have
    /// already diverged and fails with `InvariantViolation`.
    pub async fn adjust_vote_count(
        conn: &mut PgConnection,
        id: DbId,
        delta: i64,
    ) -> QueueResult<Entry> {
        let query = format!(
            "UPDATE entries SET vote_count = vote_count + $2, updated_at = NOW() \
             WHERE id = $1 AND vote_count + $2 >= 0 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Entry>(&query)
            .bind(id)
            .bind(delta)
            .fetch_optional(&mut *conn)
            .await?;

        if let Some(entry) = updated {
            return Ok(entry);
        }

        let current = Self::get(conn, id).await?;
        let err = match apply_vote_delta(id, current.vote_count, delta) {
            Err(err) => err,
            Ok(_) => CoreError::InvariantViolation(format!(
                "vote_count of entry {id} changed during adjustment"
            )),
        };
        tracing::error!(
            entry_id = id,
            delta,
            vote_count = current.vote_count,
            error = %err,
            "Rejected vote count adjustment",
        );
        Err(err.into())
    }
}

fn not_found(id: DbId) -> crate::error::QueueError {
    CoreError::NotFound {
        entity: "entry",
        id,
    }
    .into()
}
