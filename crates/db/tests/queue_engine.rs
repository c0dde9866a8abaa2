//! Integration tests for `QueueEngine`: vote atomicity, idempotency,
//! ranking, and reconciliation.

use std::time::Duration;

use assert_matches::assert_matches;
use futures::future::join_all;
use sqlx::PgPool;

use crowdqueue_core::entry::EntryState;
use crowdqueue_core::error::CoreError;
use crowdqueue_db::engine::QueueEngine;
use crowdqueue_db::models::entry::{Entry, NewEntry};
use crowdqueue_db::repositories::EntryRepo;
use crowdqueue_db::QueueError;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const PLAYLIST: &str = "creator-1";

fn video(n: u32) -> NewEntry {
    NewEntry::from_url(
        &format!("https://youtu.be/vid{n:08}"),
        Some(&format!("Video {n}")),
        None,
    )
    .unwrap()
}

fn ids(entries: &[Entry]) -> Vec<i64> {
    entries.iter().map(|e| e.id).collect()
}

async fn vote_count(engine: &QueueEngine, entry_id: i64) -> i64 {
    engine.entry(entry_id).await.unwrap().vote_count
}

// ---------------------------------------------------------------------------
// Test: enqueue
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_enqueue_does_not_vote_for_creator(pool: PgPool) {
    let engine = QueueEngine::new(pool);
    let entry = engine.enqueue(PLAYLIST, &video(1)).await.unwrap();

    assert_eq!(entry.vote_count, 0);
    assert_eq!(entry.state, EntryState::Queued);
    assert!(!engine.has_voted("creator", entry.id).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_enqueue_rejects_blank_playlist(pool: PgPool) {
    let engine = QueueEngine::new(pool);
    let err = engine.enqueue(" ", &video(1)).await.unwrap_err();
    assert_matches!(err, QueueError::Core(CoreError::Validation(_)));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_enqueue_duplicate_source(pool: PgPool) {
    let engine = QueueEngine::new(pool);
    engine.enqueue(PLAYLIST, &video(1)).await.unwrap();
    let err = engine.enqueue(PLAYLIST, &video(1)).await.unwrap_err();
    assert_matches!(err, QueueError::Core(CoreError::DuplicateSource { .. }));
}

// ---------------------------------------------------------------------------
// Test: voting properties
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_repeat_upvote_counts_once(pool: PgPool) {
    let engine = QueueEngine::new(pool);
    let entry = engine.enqueue(PLAYLIST, &video(1)).await.unwrap();

    let after_first = engine.upvote("alice", entry.id).await.unwrap();
    assert_eq!(after_first.vote_count, 1);

    let err = engine.upvote("alice", entry.id).await.unwrap_err();
    assert_matches!(err, QueueError::Core(CoreError::AlreadyVoted { .. }));
    assert_eq!(vote_count(&engine, entry.id).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_upvote_then_downvote_restores_count(pool: PgPool) {
    let engine = QueueEngine::new(pool);
    let entry = engine.enqueue(PLAYLIST, &video(1)).await.unwrap();
    engine.upvote("bob", entry.id).await.unwrap();
    let before = vote_count(&engine, entry.id).await;

    engine.upvote("alice", entry.id).await.unwrap();
    assert!(engine.has_voted("alice", entry.id).await.unwrap());
    let after = engine.downvote("alice", entry.id).await.unwrap();

    assert_eq!(after.vote_count, before);
    assert!(!engine.has_voted("alice", entry.id).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_downvote_without_vote_leaves_count(pool: PgPool) {
    let engine = QueueEngine::new(pool);
    let entry = engine.enqueue(PLAYLIST, &video(1)).await.unwrap();

    let err = engine.downvote("alice", entry.id).await.unwrap_err();
    assert_matches!(err, QueueError::Core(CoreError::NoSuchVote { .. }));
    assert_eq!(vote_count(&engine, entry.id).await, 0);

    engine.upvote("bob", entry.id).await.unwrap();
    let err = engine.downvote("alice", entry.id).await.unwrap_err();
    assert_matches!(err, QueueError::Core(CoreError::NoSuchVote { .. }));
    assert_eq!(vote_count(&engine, entry.id).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_vote_on_missing_entry_is_not_found(pool: PgPool) {
    let engine = QueueEngine::new(pool);
    let err = engine.upvote("alice", 123_456).await.unwrap_err();
    assert_matches!(err, QueueError::Core(CoreError::NotFound { id: 123_456, .. }));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_interleaved_votes_never_go_negative(pool: PgPool) {
    let engine = QueueEngine::new(pool);
    let entry = engine.enqueue(PLAYLIST, &video(1)).await.unwrap();

    let script: [(&str, bool); 8] = [
        ("alice", true),
        ("alice", false),
        ("alice", false),
        ("bob", false),
        ("bob", true),
        ("alice", true),
        ("bob", false),
        ("bob", false),
    ];
    for (user, up) in script {
        let _ = if up {
            engine.upvote(user, entry.id).await
        } else {
            engine.downvote(user, entry.id).await
        };
        assert!(vote_count(&engine, entry.id).await >= 0);
    }

    // alice holds one vote, bob none.
    assert_eq!(vote_count(&engine, entry.id).await, 1);
    assert!(engine.audit_playlist(PLAYLIST).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_upvotes_are_not_lost(pool: PgPool) {
    let engine = QueueEngine::new(pool);
    let entry = engine.enqueue(PLAYLIST, &video(1)).await.unwrap();

    let voters: Vec<String> = (0..6).map(|i| format!("user-{i}")).collect();
    let tasks = voters.iter().cloned().map(|user| {
        let engine = engine.clone();
        let entry_id = entry.id;
        tokio::spawn(async move { engine.upvote(&user, entry_id).await })
    });

    for result in join_all(tasks).await {
        result.unwrap().unwrap();
    }

    assert_eq!(vote_count(&engine, entry.id).await, voters.len() as i64);
    let tally = engine.audit_entry(entry.id).await.unwrap();
    assert!(tally.is_consistent());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_duplicate_upvotes_count_once(pool: PgPool) {
    let engine = QueueEngine::new(pool);
    let entry = engine.enqueue(PLAYLIST, &video(1)).await.unwrap();

    let tasks = (0..4).map(|_| {
        let engine = engine.clone();
        let entry_id = entry.id;
        tokio::spawn(async move { engine.upvote("alice", entry_id).await })
    });
    let results: Vec<_> = join_all(tasks).await.into_iter().map(|r| r.unwrap()).collect();

    let ok = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_matches!(err, QueueError::Core(CoreError::AlreadyVoted { .. }));
    }
    assert_eq!(vote_count(&engine, entry.id).await, 1);
}

// ---------------------------------------------------------------------------
// Test: ranking
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_ranking_votes_then_creation_order(pool: PgPool) {
    let engine = QueueEngine::new(pool);
    let a = engine.enqueue(PLAYLIST, &video(1)).await.unwrap();
    let b = engine.enqueue(PLAYLIST, &video(2)).await.unwrap();
    let c = engine.enqueue(PLAYLIST, &video(3)).await.unwrap();

    for user in ["u1", "u2"] {
        engine.upvote(user, a.id).await.unwrap();
        engine.upvote(user, b.id).await.unwrap();
    }
    for user in ["u1", "u2", "u3"] {
        engine.upvote(user, c.id).await.unwrap();
    }

    let ranked = engine.ranked_queue(PLAYLIST).await.unwrap();
    assert_eq!(ids(&ranked), vec![c.id, a.id, b.id]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_ranked_queue_is_per_playlist(pool: PgPool) {
    let engine = QueueEngine::new(pool);
    let mine = engine.enqueue(PLAYLIST, &video(1)).await.unwrap();
    engine.enqueue("creator-2", &video(2)).await.unwrap();

    let ranked = engine.ranked_queue(PLAYLIST).await.unwrap();
    assert_eq!(ids(&ranked), vec![mine.id]);
    assert!(engine.ranked_queue("nobody").await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: reconciliation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_audit_detects_drift(pool: PgPool) {
    let engine = QueueEngine::new(pool.clone());
    let entry = engine.enqueue(PLAYLIST, &video(1)).await.unwrap();
    engine.upvote("alice", entry.id).await.unwrap();

    assert!(engine.audit_entry(entry.id).await.unwrap().is_consistent());
    assert!(engine.audit_playlist(PLAYLIST).await.unwrap().is_empty());

    // Corrupt the cache behind the engine's back.
    sqlx::query("UPDATE entries SET vote_count = 5 WHERE id = $1")
        .bind(entry.id)
        .execute(&pool)
        .await
        .unwrap();

    let tally = engine.audit_entry(entry.id).await.unwrap();
    assert_eq!((tally.cached, tally.ledger), (5, 1));
    assert_eq!(tally.drift(), 4);

    let drifted = engine.audit_playlist(PLAYLIST).await.unwrap();
    assert_eq!(drifted.len(), 1);
    assert_eq!(drifted[0].entry_id, entry.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_failed_vote_rolls_back_ledger_write(pool: PgPool) {
    let engine = QueueEngine::new(pool.clone());
    let entry = engine.enqueue(PLAYLIST, &video(1)).await.unwrap();
    engine.upvote("alice", entry.id).await.unwrap();

    // Force the counter below the ledger so the retraction's decrement fails.
    sqlx::query("UPDATE entries SET vote_count = 0 WHERE id = $1")
        .bind(entry.id)
        .execute(&pool)
        .await
        .unwrap();

    let err = engine.downvote("alice", entry.id).await.unwrap_err();
    assert_matches!(err, QueueError::Core(CoreError::InvariantViolation(_)));

    // The ledger delete was rolled back with the failed decrement.
    assert!(engine.has_voted("alice", entry.id).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cancelled_vote_leaves_no_trace(pool: PgPool) {
    let engine = QueueEngine::new(pool.clone());
    let entry = engine.enqueue(PLAYLIST, &video(1)).await.unwrap();

    // Hold the entry's row lock so the vote below cannot get past it.
    let mut holder = pool.begin().await.unwrap();
    EntryRepo::lock(&mut *holder, entry.id).await.unwrap();

    let voter = engine.clone();
    let entry_id = entry.id;
    let task = tokio::spawn(async move { voter.upvote("alice", entry_id).await });

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!task.is_finished(), "upvote should be blocked on the row lock");

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    holder.rollback().await.unwrap();

    assert!(!engine.has_voted("alice", entry_id).await.unwrap());
    assert_eq!(engine.entry(entry_id).await.unwrap().vote_count, 0);
    assert!(engine.audit_playlist(PLAYLIST).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_voted_entry_ids(pool: PgPool) {
    let engine = QueueEngine::new(pool);
    let a = engine.enqueue(PLAYLIST, &video(1)).await.unwrap();
    let b = engine.enqueue(PLAYLIST, &video(2)).await.unwrap();
    engine.upvote("alice", a.id).await.unwrap();
    engine.upvote("alice", b.id).await.unwrap();
    engine.downvote("alice", a.id).await.unwrap();

    assert_eq!(engine.voted_entry_ids("alice", PLAYLIST).await.unwrap(), vec![b.id]);
}
