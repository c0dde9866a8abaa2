//! Queue ordering policy.
//!
//! Entries are ranked by vote count, highest first. Equal counts fall back to
//! creation order (first queued, first served), with the entry id as the last
//! resort so two rows created in the same instant still order the same way on
//! every read.

use std::cmp::Ordering;

use crate::entry::EntryState;
use crate::types::{DbId, Timestamp};

/// Anything that can be placed in a ranked queue.
pub trait Rankable {
    fn rank_id(&self) -> DbId;
    fn rank_votes(&self) -> i64;
    fn rank_created_at(&self) -> Timestamp;
    fn rank_state(&self) -> EntryState;
}

/// Total order used for the play queue: `Less` means `a` plays before `b`.
pub fn compare_rank<T: Rankable>(a: &T, b: &T) -> Ordering {
    b.rank_votes()
        .cmp(&a.rank_votes())
        .then_with(|| a.rank_created_at().cmp(&b.rank_created_at()))
        .then_with(|| a.rank_id().cmp(&b.rank_id()))
}

/// Drop every non-`Queued` entry and sort the rest into play order.
pub fn rank_queue<T: Rankable>(entries: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut queued: Vec<T> = entries
        .into_iter()
        .filter(|e| e.rank_state() == EntryState::Queued)
        .collect();
    queued.sort_by(compare_rank);
    queued
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    #[derive(Debug, Clone)]
    struct Item {
        id: DbId,
        votes: i64,
        created_at: Timestamp,
        state: EntryState,
    }

    impl Rankable for Item {
        fn rank_id(&self) -> DbId {
            self.id
        }
        fn rank_votes(&self) -> i64 {
            self.votes
        }
        fn rank_created_at(&self) -> Timestamp {
            self.created_at
        }
        fn rank_state(&self) -> EntryState {
            self.state
        }
    }

    fn item(id: DbId, votes: i64, offset_secs: i64) -> Item {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        Item {
            id,
            votes,
            created_at: base + Duration::seconds(offset_secs),
            state: EntryState::Queued,
        }
    }

    fn ids(items: &[Item]) -> Vec<DbId> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn votes_first_then_creation_order() {
        let a = item(1, 2, 0);
        let b = item(2, 2, 1);
        let c = item(3, 3, 2);
        let ranked = rank_queue(vec![b, c, a]);
        assert_eq!(ids(&ranked), vec![3, 1, 2]);
    }

    #[test]
    fn all_zero_votes_keeps_creation_order() {
        let ranked = rank_queue(vec![item(3, 0, 2), item(1, 0, 0), item(2, 0, 1)]);
        assert_eq!(ids(&ranked), vec![1, 2, 3]);
    }

    #[test]
    fn identical_timestamps_fall_back_to_id() {
        let ranked = rank_queue(vec![item(9, 1, 0), item(4, 1, 0)]);
        assert_eq!(ids(&ranked), vec![4, 9]);
    }

    #[test]
    fn non_queued_entries_are_excluded() {
        let mut playing = item(1, 10, 0);
        playing.state = EntryState::Playing;
        let mut played = item(2, 10, 0);
        played.state = EntryState::Played;
        let ranked = rank_queue(vec![playing, played, item(3, 0, 5)]);
        assert_eq!(ids(&ranked), vec![3]);
    }

    #[test]
    fn ranking_is_independent_of_input_order() {
        let items = vec![item(1, 0, 0), item(2, 5, 1), item(3, 5, 2), item(4, 1, 3)];
        let mut reversed = items.clone();
        reversed.reverse();
        assert_eq!(ids(&rank_queue(items)), ids(&rank_queue(reversed)));
    }

    #[test]
    fn empty_input_yields_empty_queue() {
        assert!(rank_queue(Vec::<Item>::new()).is_empty());
    }
}
