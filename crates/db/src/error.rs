use crowdqueue_core::error::CoreError;

/// Error returned by repositories and the queue engine.
///
/// Domain failures (duplicate source, vote preconditions, illegal transitions)
/// arrive as [`CoreError`]; anything the database itself reports stays a
/// [`sqlx::Error`] so the caller can classify it.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type QueueResult<T> = Result<T, QueueError>;
