//! Repository layer: the entry store and the vote ledger.
//!
//! Every method takes a `&mut PgConnection` so the queue engine can run several
//! of them inside one transaction (`&mut *tx`). Standalone callers pass a
//! pooled connection.

pub mod entry_repo;
pub mod vote_repo;

pub use entry_repo::EntryRepo;
pub use vote_repo::VoteRepo;
