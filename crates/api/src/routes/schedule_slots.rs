//! Route definitions for the `/schedule-slots` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::substitutes;
use crate::state::AppState;

/// Routes mounted at `/schedule-slots`.
///
/// ```text
/// GET    /{id}/substitutes      -> list_for_slot   (?date=&exclude_teacher_id=)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/substitutes", get(substitutes::list_for_slot))
}
