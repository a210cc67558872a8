//! Handlers for the `/leaves` resource.
//!
//! Teachers file, edit and withdraw their own leave requests. Curriculum
//! staff may act on anyone's and are the only ones who decide them.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use presensi_core::error::CoreError;
use presensi_core::leave::{LeaveDraft, LeaveReason, LeaveStatus};
use presensi_core::roles::is_curriculum_staff;
use presensi_core::types::DbId;
use presensi_db::models::leave::{LeaveListFilter, LeaveRequest, LeaveRequestDetail};
use presensi_db::models::user::TeacherRef;
use presensi_engine::leave::{ApprovalOutcome, LeaveChanges, LeaveListPage};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAuth, RequireCurriculum};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitLeaveRequest {
    /// Defaults to the caller.
    pub teacher_id: Option<DbId>,
    pub reason: LeaveReason,
    #[validate(length(max = 255))]
    pub custom_reason: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub substitute_teacher_id: Option<DbId>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLeaveRequest {
    pub reason: LeaveReason,
    #[validate(length(max = 255))]
    pub custom_reason: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub substitute_teacher_id: Option<DbId>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RejectLeaveRequest {
    #[validate(length(min = 1, max = 500))]
    pub rejection_reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ListLeavesParams {
    pub status: Option<LeaveStatus>,
    pub teacher_id: Option<DbId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateParams {
    pub teacher_id: DbId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Non-staff users may only act on their own leave requests.
fn ensure_may_act_for(user: &AuthUser, teacher_id: DbId) -> Result<(), AppError> {
    if user.user_id == teacher_id || is_curriculum_staff(&user.role) {
        return Ok(());
    }
    Err(AppError::Core(CoreError::Forbidden(
        "You can only manage your own leave requests".into(),
    )))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/leaves
///
/// Returns the created request with HTTP 201.
pub async fn submit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<SubmitLeaveRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<LeaveRequest>>)> {
    input.validate()?;
    let teacher_id = input.teacher_id.unwrap_or(user.user_id);
    ensure_may_act_for(&user, teacher_id)?;

    let draft = LeaveDraft {
        teacher_id,
        reason: input.reason,
        custom_reason: input.custom_reason,
        start_date: input.start_date,
        end_date: input.end_date,
        substitute_teacher_id: input.substitute_teacher_id,
    };
    let leave = state.leaves.submit(draft, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: leave })))
}

/// GET /api/v1/leaves
///
/// Staff see every request; teachers only their own.
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<ListLeavesParams>,
) -> AppResult<Json<DataResponse<LeaveListPage>>> {
    if let (Some(from), Some(to)) = (params.from, params.to) {
        if to < from {
            return Err(AppError::BadRequest(format!(
                "'to' ({to}) must not be before 'from' ({from})"
            )));
        }
    }
    let teacher_id = if is_curriculum_staff(&user.role) {
        params.teacher_id
    } else {
        Some(user.user_id)
    };
    let page = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };
    let filter = LeaveListFilter {
        status: params.status,
        teacher_id,
        from: params.from,
        to: params.to,
        limit: page.limit(),
        offset: page.offset(),
    };
    let leaves = state.leaves.list(&filter).await?;
    Ok(Json(DataResponse { data: leaves }))
}

/// GET /api/v1/leaves/{id}
pub async fn get(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(leave_id): Path<DbId>,
) -> AppResult<Json<DataResponse<LeaveRequestDetail>>> {
    let detail = state.leaves.get(leave_id).await?;
    if detail.leave.substitute_teacher_id != Some(user.user_id) {
        ensure_may_act_for(&user, detail.leave.teacher_id)?;
    }
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /api/v1/leaves/{id}
///
/// Only pending requests can be edited; the teacher cannot be changed.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(leave_id): Path<DbId>,
    Json(input): Json<UpdateLeaveRequest>,
) -> AppResult<Json<DataResponse<LeaveRequest>>> {
    input.validate()?;
    let existing = state.leaves.get(leave_id).await?;
    ensure_may_act_for(&user, existing.leave.teacher_id)?;

    let changes = LeaveChanges {
        reason: input.reason,
        custom_reason: input.custom_reason,
        start_date: input.start_date,
        end_date: input.end_date,
        substitute_teacher_id: input.substitute_teacher_id,
    };
    let leave = state.leaves.update(leave_id, changes).await?;
    Ok(Json(DataResponse { data: leave }))
}

/// DELETE /api/v1/leaves/{id}
///
/// Withdraw a pending request. Returns 204 No Content.
pub async fn withdraw(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(leave_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let existing = state.leaves.get(leave_id).await?;
    ensure_may_act_for(&user, existing.leave.teacher_id)?;
    state.leaves.withdraw(leave_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/leaves/{id}/approve
///
/// Approves the request and runs the substitution cascade in one
/// transaction.
pub async fn approve(
    State(state): State<AppState>,
    RequireCurriculum(user): RequireCurriculum,
    Path(leave_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ApprovalOutcome>>> {
    let outcome = state.leaves.approve(leave_id, user.user_id).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/leaves/{id}/reject
pub async fn reject(
    State(state): State<AppState>,
    RequireCurriculum(user): RequireCurriculum,
    Path(leave_id): Path<DbId>,
    Json(input): Json<RejectLeaveRequest>,
) -> AppResult<Json<DataResponse<LeaveRequest>>> {
    input.validate()?;
    let leave = state
        .leaves
        .reject(leave_id, user.user_id, &input.rejection_reason)
        .await?;
    Ok(Json(DataResponse { data: leave }))
}

/// GET /api/v1/leaves/substitute-candidates?teacher_id=&start_date=&end_date=
///
/// Teachers free of approved leave across the whole range, for the
/// substitute picker on the leave form.
pub async fn substitute_candidates(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(params): Query<CandidateParams>,
) -> AppResult<Json<DataResponse<Vec<TeacherRef>>>> {
    let candidates = state
        .leaves
        .substitute_candidates_for_range(params.teacher_id, params.start_date, params.end_date)
        .await?;
    Ok(Json(DataResponse { data: candidates }))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn user(id: DbId, role: &str) -> AuthUser {
        AuthUser {
            user_id: id,
            role: role.to_string(),
        }
    }

    #[test]
    fn teachers_act_only_for_themselves() {
        assert!(ensure_may_act_for(&user(3, "guru"), 3).is_ok());
        assert_matches!(
            ensure_may_act_for(&user(3, "guru"), 4),
            Err(AppError::Core(CoreError::Forbidden(_)))
        );
    }

    #[test]
    fn curriculum_staff_act_for_anyone() {
        assert!(ensure_may_act_for(&user(1, "kurikulum"), 4).is_ok());
        assert!(ensure_may_act_for(&user(1, "admin"), 4).is_ok());
        assert!(ensure_may_act_for(&user(1, "kepala_sekolah"), 4).is_err());
    }
}
