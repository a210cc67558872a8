//! Handler for substitute lookups on a single period.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use presensi_core::types::DbId;
use presensi_db::models::user::TeacherRef;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubstituteParams {
    pub date: NaiveDate,
    /// Another teacher to leave out, e.g. one already asked.
    pub exclude_teacher_id: Option<DbId>,
}

/// GET /api/v1/schedule-slots/{id}/substitutes?date=
///
/// Teachers free to cover the slot on `date`, ordered by name. An empty
/// list is a normal answer.
pub async fn list_for_slot(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(slot_id): Path<DbId>,
    Query(params): Query<SubstituteParams>,
) -> AppResult<Json<DataResponse<Vec<TeacherRef>>>> {
    let candidates = state
        .matcher
        .find_candidates(slot_id, params.date, params.exclude_teacher_id)
        .await?;
    Ok(Json(DataResponse { data: candidates }))
}
