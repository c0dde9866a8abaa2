//! Repository for the `votes` table (the vote ledger).
//!
//! The ledger is the ground truth for vote counts. `entries.vote_count` is a
//! cache the engine keeps in step with it inside the same transaction.

use sqlx::PgConnection;

use crowdqueue_core::error::CoreError;
use crowdqueue_core::types::DbId;
use crowdqueue_core::vote::VoteTally;

use crate::error::QueueResult;
use crate::models::vote::Vote;

/// Column list for `votes` queries.
const COLUMNS: &str = "id, user_id, entry_id, created_at";

/// Durable record of which user endorses which entry.
pub struct VoteRepo;

impl VoteRepo {
    /// Record a vote. Fails with `AlreadyVoted` if `(user_id, entry_id)` is
    /// already in the ledger.
    pub async fn cast(conn: &mut PgConnection, user_id: &str, entry_id: DbId) -> QueueResult<Vote> {
        let query = format!(
            "INSERT INTO votes (user_id, entry_id) VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT uq_votes_user_entry DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let vote = sqlx::query_as::<_, Vote>(&query)
            .bind(user_id)
            .bind(entry_id)
            .fetch_optional(&mut *conn)
            .await?;

        vote.ok_or_else(|| {
            CoreError::AlreadyVoted {
                user_id: user_id.to_string(),
                entry_id,
            }
            .into()
        })
    }

    /// Remove a vote. Fails with `NoSuchVote` if the user never voted.
    pub async fn retract(
        conn: &mut PgConnection,
        user_id: &str,
        entry_id: DbId,
    ) -> QueueResult<()> {
        let result = sqlx::query("DELETE FROM votes WHERE user_id = $1 AND entry_id = $2")
            .bind(user_id)
            .bind(entry_id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NoSuchVote {
                user_id: user_id.to_string(),
                entry_id,
            }
            .into());
        }
        Ok(())
    }

    pub async fn has_voted(
        conn: &mut PgConnection,
        user_id: &str,
        entry_id: DbId,
    ) -> QueueResult<bool> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM votes WHERE user_id = $1 AND entry_id = $2)",
        )
        .bind(user_id)
        .bind(entry_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row.0)
    }

    /// Number of ledger votes for an entry. Reconciliation only; the hot
    /// path reads the cached `vote_count`.
    pub async fn count_for(conn: &mut PgConnection, entry_id: DbId) -> QueueResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM votes WHERE entry_id = $1")
            .bind(entry_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(row.0)
    }

    /// Ids of the entries in a playlist that the user currently votes for.
    pub async fn voted_entry_ids(
        conn: &mut PgConnection,
        user_id: &str,
        playlist_id: &str,
    ) -> QueueResult<Vec<DbId>> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT v.entry_id FROM votes v \
             JOIN entries e ON e.id = v.entry_id \
             WHERE v.user_id = $1 AND e.playlist_id = $2 \
             ORDER BY v.entry_id",
        )
        .bind(user_id)
        .bind(playlist_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Cached count next to ledger count for every entry of a playlist.
    pub async fn tallies_for_playlist(
        conn: &mut PgConnection,
        playlist_id: &str,
    ) -> QueueResult<Vec<VoteTally>> {
        let rows: Vec<(DbId, i64, i64)> = sqlx::query_as(
            "SELECT e.id, e.vote_count, COUNT(v.id) \
             FROM entries e \
             LEFT JOIN votes v ON v.entry_id = e.id \
             WHERE e.playlist_id = $1 \
             GROUP BY e.id, e.vote_count \
             ORDER BY e.id",
        )
        .bind(playlist_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(entry_id, cached, ledger)| VoteTally {
                entry_id,
                cached,
                ledger,
            })
            .collect())
    }
}
