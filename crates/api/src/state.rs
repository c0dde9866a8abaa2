use std::sync::Arc;

use crowdqueue_db::engine::{NextSelector, QueueEngine};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool, engine, and selector are handles.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: crowdqueue_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Vote-ordered queue engine.
    pub engine: QueueEngine,
    /// Playback advancement.
    pub selector: NextSelector,
}

impl AppState {
    pub fn new(pool: crowdqueue_db::DbPool, config: ServerConfig) -> Self {
        Self {
            engine: QueueEngine::new(pool.clone()),
            selector: NextSelector::new(pool.clone()),
            pool,
            config: Arc::new(config),
        }
    }
}
