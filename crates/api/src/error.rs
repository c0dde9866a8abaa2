use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crowdqueue_core::error::CoreError;
use crowdqueue_db::QueueError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `crowdqueue_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A request body that failed field-level validation.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<QueueError> for AppError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Core(core) => AppError::Core(core),
            QueueError::Database(db) => AppError::Database(db),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a domain error to an HTTP status, error code, and message.
///
/// Vote-state precondition failures are surfaced as 409s rather than
/// swallowed, so clients can show "already voted" and retries after a
/// timeout can recognise their own earlier success.
fn classify_core_error(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", core.to_string()),
        CoreError::DuplicateSource { .. } => {
            (StatusCode::CONFLICT, "DUPLICATE_SOURCE", core.to_string())
        }
        CoreError::AlreadyVoted { .. } => (StatusCode::CONFLICT, "ALREADY_VOTED", core.to_string()),
        CoreError::NoSuchVote { .. } => (StatusCode::CONFLICT, "NO_SUCH_VOTE", core.to_string()),
        CoreError::InvalidTransition { .. } => {
            (StatusCode::CONFLICT, "INVALID_TRANSITION", core.to_string())
        }
        CoreError::EmptyQueue { .. } => (StatusCode::CONFLICT, "EMPTY_QUEUE", core.to_string()),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::InvariantViolation(msg) => {
            tracing::error!(error = %msg, "Queue invariant violated");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INVARIANT_VIOLATION",
                "An internal consistency error occurred".to_string(),
            )
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use crowdqueue_core::entry::EntryState;

    use super::*;

    fn status_and_code(err: CoreError) -> (StatusCode, &'static str) {
        let (status, code, _) = classify_core_error(&err);
        (status, code)
    }

    #[test]
    fn vote_preconditions_are_conflicts() {
        assert_eq!(
            status_and_code(CoreError::AlreadyVoted {
                user_id: "u".into(),
                entry_id: 1
            }),
            (StatusCode::CONFLICT, "ALREADY_VOTED")
        );
        assert_eq!(
            status_and_code(CoreError::NoSuchVote {
                user_id: "u".into(),
                entry_id: 1
            }),
            (StatusCode::CONFLICT, "NO_SUCH_VOTE")
        );
    }

    #[test]
    fn queue_state_errors() {
        assert_eq!(
            status_and_code(CoreError::EmptyQueue {
                playlist_id: "p".into()
            }),
            (StatusCode::CONFLICT, "EMPTY_QUEUE")
        );
        assert_eq!(
            status_and_code(CoreError::InvalidTransition {
                entry_id: 1,
                from: EntryState::Played,
                to: EntryState::Queued
            }),
            (StatusCode::CONFLICT, "INVALID_TRANSITION")
        );
        assert_eq!(
            status_and_code(CoreError::NotFound {
                entity: "entry",
                id: 3
            }),
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        );
    }

    #[test]
    fn invariant_violation_hides_details() {
        let (status, code, message) =
            classify_core_error(&CoreError::InvariantViolation("vote_count -1".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INVARIANT_VIOLATION");
        assert!(!message.contains("vote_count"));
    }

    #[test]
    fn queue_error_splits_into_variants() {
        let app: AppError = QueueError::Core(CoreError::Validation("x".into())).into();
        assert!(matches!(app, AppError::Core(CoreError::Validation(_))));
        let app: AppError = QueueError::Database(sqlx::Error::RowNotFound).into();
        assert!(matches!(app, AppError::Database(sqlx::Error::RowNotFound)));
    }
}
