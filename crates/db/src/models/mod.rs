pub mod entry;
pub mod vote;
