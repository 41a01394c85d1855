pub mod health;
pub mod validation;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /validate                 POST  run a rule set against submitted data
/// /validation/rules         GET   list supported rule names
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(validation::router())
}
