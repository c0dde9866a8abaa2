//! The queue engine.
//!
//! Owns the only mutation path into the entry store and the vote ledger. A
//! vote is a ledger write plus a counter write; both happen in one
//! transaction behind the entry's row lock, so either both land or neither
//! does. Dropping an in-flight call drops its transaction, which Postgres
//! rolls back.

use sqlx::PgPool;

use crowdqueue_core::ranking::rank_queue;
use crowdqueue_core::types::DbId;
use crowdqueue_core::validation::{validate_playlist_id, validate_user_id};
use crowdqueue_core::vote::{VoteDirection, VoteTally};

use crate::error::QueueResult;
use crate::models::entry::{Entry, EntryListQuery, NewEntry};
use crate::repositories::{EntryRepo, VoteRepo};

/// Vote-ordered queue engine. Cheap to clone; shares the pool.
#[derive(Clone)]
pub struct QueueEngine {
    pool: PgPool,
}

impl QueueEngine {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a stream to a playlist's queue. No vote is cast for the creator.
    pub async fn enqueue(&self, playlist_id: &str, input: &NewEntry) -> QueueResult<Entry> {
        validate_playlist_id(playlist_id)?;
        let mut conn = self.pool.acquire().await?;
        let entry = EntryRepo::create(&mut *conn, playlist_id, input).await?;
        tracing::info!(
            entry_id = entry.id,
            playlist_id = %playlist_id,
            source = %input.source,
            "Entry enqueued",
        );
        Ok(entry)
    }

    /// Endorse an entry. Fails with `AlreadyVoted` on a repeat vote, leaving
    /// the count untouched.
    pub async fn upvote(&self, user_id: &str, entry_id: DbId) -> QueueResult<Entry> {
        self.apply_vote(user_id, entry_id, VoteDirection::Up).await
    }

    /// Withdraw an endorsement. Fails with `NoSuchVote` if there is none,
    /// leaving the count untouched.
    pub async fn downvote(&self, user_id: &str, entry_id: DbId) -> QueueResult<Entry> {
        self.apply_vote(user_id, entry_id, VoteDirection::Down).await
    }

    async fn apply_vote(
        &self,
        user_id: &str,
        entry_id: DbId,
        direction: VoteDirection,
    ) -> QueueResult<Entry> {
        validate_user_id(user_id)?;

        let mut tx = self.pool.begin().await?;

        // Serializes all votes on this entry until commit or rollback.
        EntryRepo::lock(&mut *tx, entry_id).await?;

        match direction {
            VoteDirection::Up => {
                VoteRepo::cast(&mut *tx, user_id, entry_id).await?;
            }
            VoteDirection::Down => {
                VoteRepo::retract(&mut *tx, user_id, entry_id).await?;
            }
        }
        let entry = EntryRepo::adjust_vote_count(&mut *tx, entry_id, direction.delta()).await?;

        tx.commit().await?;

        tracing::info!(
            user_id = %user_id,
            entry_id,
            ?direction,
            vote_count = entry.vote_count,
            "Vote applied",
        );
        Ok(entry)
    }

    /// The playlist's `Queued` entries in play order.
    pub async fn ranked_queue(&self, playlist_id: &str) -> QueueResult<Vec<Entry>> {
        validate_playlist_id(playlist_id)?;
        let mut conn = self.pool.acquire().await?;
        let active = EntryRepo::list_active(&mut *conn, playlist_id).await?;
        Ok(rank_queue(active))
    }

    pub async fn entry(&self, entry_id: DbId) -> QueueResult<Entry> {
        let mut conn = self.pool.acquire().await?;
        EntryRepo::get(&mut *conn, entry_id).await
    }

    /// All entries of a playlist regardless of state, in creation order.
    pub async fn entries(
        &self,
        playlist_id: &str,
        params: &EntryListQuery,
    ) -> QueueResult<Vec<Entry>> {
        validate_playlist_id(playlist_id)?;
        let mut conn = self.pool.acquire().await?;
        EntryRepo::list(&mut *conn, playlist_id, params).await
    }

    pub async fn has_voted(&self, user_id: &str, entry_id: DbId) -> QueueResult<bool> {
        validate_user_id(user_id)?;
        let mut conn = self.pool.acquire().await?;
        VoteRepo::has_voted(&mut *conn, user_id, entry_id).await
    }

    pub async fn voted_entry_ids(
        &self,
        user_id: &str,
        playlist_id: &str,
    ) -> QueueResult<Vec<DbId>> {
        validate_user_id(user_id)?;
        validate_playlist_id(playlist_id)?;
        let mut conn = self.pool.acquire().await?;
        VoteRepo::voted_entry_ids(&mut *conn, user_id, playlist_id).await
    }

    // -----------------------------------------------------------------------
    // Reconciliation
    // -----------------------------------------------------------------------

    /// Compare one entry's cached `vote_count` with its ledger count.
    ///
    /// Both reads share a repeatable-read snapshot so an in-flight vote cannot
    /// show up in one and not the other.
    pub async fn audit_entry(&self, entry_id: DbId) -> QueueResult<VoteTally> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let entry = EntryRepo::get(&mut *tx, entry_id).await?;
        let ledger = VoteRepo::count_for(&mut *tx, entry_id).await?;
        tx.commit().await?;

        let tally = VoteTally {
            entry_id,
            cached: entry.vote_count,
            ledger,
        };
        if !tally.is_consistent() {
            tracing::warn!(
                entry_id,
                cached = tally.cached,
                ledger = tally.ledger,
                drift = tally.drift(),
                "Vote count drift detected",
            );
        }
        Ok(tally)
    }

    /// Every entry of a playlist whose cached count disagrees with the ledger.
    /// Empty means the playlist is consistent.
    pub async fn audit_playlist(&self, playlist_id: &str) -> QueueResult<Vec<VoteTally>> {
        validate_playlist_id(playlist_id)?;
        let mut conn = self.pool.acquire().await?;
        let drifted: Vec<VoteTally> = VoteRepo::tallies_for_playlist(&mut *conn, playlist_id)
            .await?
            .into_iter()
            .filter(|t| !t.is_consistent())
            .collect();

        for tally in &drifted {
            tracing::warn!(
                playlist_id = %playlist_id,
                entry_id = tally.entry_id,
                cached = tally.cached,
                ledger = tally.ledger,
                drift = tally.drift(),
                "Vote count drift detected",
            );
        }
        Ok(drifted)
    }
}
