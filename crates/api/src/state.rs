use std::sync::Arc;

use flashmart_core::clock::Clock;

use crate::catalog::CatalogClient;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: flashmart_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Time authority. All window comparisons go through this so tests can
    /// pin the clock.
    pub clock: Arc<dyn Clock>,
    /// External catalog service, consulted only at sale creation.
    pub catalog: Arc<dyn CatalogClient>,
}
