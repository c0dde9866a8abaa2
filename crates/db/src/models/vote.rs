//! Vote ledger model.

use serde::Serialize;
use sqlx::FromRow;

use crowdqueue_core::types::{DbId, Timestamp};

/// A row from the `votes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Vote {
    pub id: DbId,
    pub user_id: String,
    pub entry_id: DbId,
    pub created_at: Timestamp,
}
