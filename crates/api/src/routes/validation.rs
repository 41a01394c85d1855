//! Route definitions for validation.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::validation;
use crate::state::AppState;

/// Routes mounted under `/api/v1`.
///
/// ```text
/// POST   /validate           -> validate
/// GET    /validation/rules   -> list_rules
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/validate", post(validation::validate))
        .route("/validation/rules", get(validation::list_rules))
}
