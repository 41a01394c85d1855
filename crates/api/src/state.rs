use std::sync::Arc;

use formguard_core::validation::evaluator::Validator;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Validation engine, with presence and URL capabilities already wired.
    pub validator: Arc<Validator>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Database pool, when `DATABASE_URL` is configured.
    pub pool: Option<formguard_db::DbPool>,
}
