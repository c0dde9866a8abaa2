//! Domain logic for the crowdqueue vote-ordered playlist queue.
//!
//! Everything in this crate is pure: no database, no HTTP. The persistence
//! layer (`crowdqueue-db`) and the request layer (`crowdqueue-api`) both lean
//! on the types and rules defined here so the state machine, ranking policy
//! and error taxonomy exist in exactly one place.

pub mod entry;
pub mod error;
pub mod pagination;
pub mod ranking;
pub mod source;
pub mod types;
pub mod validation;
pub mod vote;
