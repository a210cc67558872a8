pub mod attendance;
pub mod health;
pub mod leaves;
pub mod schedule_slots;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /attendance/pending                       pending queue grouped by class
/// /attendance/arrivals                      report arrival (POST)
/// /attendance/absences                      mark absent (POST, staff)
/// /attendance/bulk-confirm                  confirm many (POST, staff)
/// /attendance/history                       filtered history
/// /attendance/statistics                    monthly statistics (staff)
/// /attendance/{id}/confirm                  confirm one (POST, staff)
/// /attendance/{id}/substitute               assign substitute (POST, staff)
///
/// /schedule-slots/{id}/substitutes          available substitutes for a date
///
/// /leaves                                   list, submit
/// /leaves/substitute-candidates             substitutes free for a date range
/// /leaves/{id}                              get, update, withdraw
/// /leaves/{id}/approve                      approve + cascade (POST, staff)
/// /leaves/{id}/reject                       reject (POST, staff)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/attendance", attendance::router())
        .nest("/schedule-slots", schedule_slots::router())
        .nest("/leaves", leaves::router())
}
