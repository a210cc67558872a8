//! Route definitions for the `/attendance` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::attendance;
use crate::state::AppState;

/// Routes mounted at `/attendance`.
///
/// ```text
/// GET    /pending               -> pending         (?date=&class_section_id=)
/// POST   /arrivals              -> report_arrival
/// POST   /absences              -> mark_absent
/// POST   /bulk-confirm          -> bulk_confirm
/// GET    /history               -> history
/// GET    /statistics            -> statistics      (?year=&month=&teacher_id=)
/// POST   /{id}/confirm          -> confirm
/// POST   /{id}/substitute       -> assign_substitute
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pending", get(attendance::pending))
        .route("/arrivals", post(attendance::report_arrival))
        .route("/absences", post(attendance::mark_absent))
        .route("/bulk-confirm", post(attendance::bulk_confirm))
        .route("/history", get(attendance::history))
        .route("/statistics", get(attendance::statistics))
        .route("/{id}/confirm", post(attendance::confirm))
        .route("/{id}/substitute", post(attendance::assign_substitute))
}
