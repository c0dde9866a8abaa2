//! Vote arithmetic and ledger reconciliation.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

/// The two vote operations. Each maps to its own engine call; there is no
/// stringly-typed action dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    /// Cast a vote: ledger insert, counter +1.
    Up,
    /// Retract a vote: ledger delete, counter -1.
    Down,
}

impl VoteDirection {
    pub fn delta(self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

/// Apply `delta` to a cached vote count.
///
/// A negative result means the ledger and the counter have already diverged,
/// so it is reported rather than clamped to zero.
pub fn apply_vote_delta(entry_id: DbId, current: i64, delta: i64) -> Result<i64, CoreError> {
    match current.checked_add(delta) {
        Some(next) if next >= 0 => Ok(next),
        _ => Err(CoreError::InvariantViolation(format!(
            "vote_count of entry {entry_id} would become negative ({current} {delta:+})"
        ))),
    }
}

/// Cached counter versus ledger count for one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    pub entry_id: DbId,
    /// `entries.vote_count`.
    pub cached: i64,
    /// Rows in `votes` for the entry. Ground truth.
    pub ledger: i64,
}

impl VoteTally {
    pub fn is_consistent(&self) -> bool {
        self.cached == self.ledger
    }

    /// How far the cache is ahead of (positive) or behind (negative) the ledger.
    pub fn drift(&self) -> i64 {
        self.cached - self.ledger
    }
}
