//! Queue orchestration: the consistency boundary over the repositories.

pub mod queue;
pub mod selector;

pub use queue::QueueEngine;
pub use selector::NextSelector;
