//! Route definitions for the `/leaves` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::leaves;
use crate::state::AppState;

/// Routes mounted at `/leaves`.
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> submit
/// GET    /substitute-candidates     -> substitute_candidates
/// GET    /{id}                      -> get
/// PUT    /{id}                      -> update
/// DELETE /{id}                      -> withdraw
/// POST   /{id}/approve              -> approve
/// POST   /{id}/reject               -> reject
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(leaves::list).post(leaves::submit))
        .route("/substitute-candidates", get(leaves::substitute_candidates))
        .route(
            "/{id}",
            get(leaves::get).put(leaves::update).delete(leaves::withdraw),
        )
        .route("/{id}/approve", post(leaves::approve))
        .route("/{id}/reject", post(leaves::reject))
}
