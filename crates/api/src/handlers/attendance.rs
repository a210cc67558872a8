//! Handlers for the `/attendance` resource.
//!
//! Arrival reports are open to any authenticated user (class captains file
//! them); every status decision requires curriculum staff.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use presensi_core::attendance::{AttendanceStatus, ConfirmStatus};
use presensi_core::statistics::MonthlyStatistics;
use presensi_core::types::DbId;
use presensi_db::models::attendance::{AttendanceHistoryFilter, AttendanceRecord};
use presensi_engine::attendance::{AttendanceHistoryPage, BulkConfirmOutcome, PendingOverview};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::rbac::{RequireAuth, RequireCurriculum};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PendingParams {
    /// Defaults to today (server local date).
    pub date: Option<NaiveDate>,
    pub class_section_id: Option<DbId>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReportArrivalRequest {
    pub schedule_slot_id: DbId,
    pub date: NaiveDate,
    pub arrival_time: Option<NaiveTime>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmRequest {
    pub status: ConfirmStatus,
    pub arrival_time: Option<NaiveTime>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkConfirmRequest {
    #[validate(length(min = 1, max = 200))]
    pub record_ids: Vec<DbId>,
    pub status: ConfirmStatus,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarkAbsentRequest {
    pub schedule_slot_id: DbId,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignSubstituteRequest {
    pub substitute_teacher_id: DbId,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub teacher_id: Option<DbId>,
    pub class_section_id: Option<DbId>,
    pub status: Option<AttendanceStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatisticsParams {
    #[validate(range(min = 2000, max = 2100))]
    pub year: i32,
    #[validate(range(min = 1, max = 12))]
    pub month: u32,
    pub teacher_id: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/attendance/pending?date=&class_section_id=
pub async fn pending(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(params): Query<PendingParams>,
) -> AppResult<Json<DataResponse<PendingOverview>>> {
    let date = params
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let overview = state
        .attendance
        .pending_overview(date, params.class_section_id)
        .await?;
    Ok(Json(DataResponse { data: overview }))
}

/// POST /api/v1/attendance/arrivals
pub async fn report_arrival(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<ReportArrivalRequest>,
) -> AppResult<Json<DataResponse<AttendanceRecord>>> {
    input.validate()?;
    let record = state
        .attendance
        .report_arrival(
            input.schedule_slot_id,
            input.date,
            input.arrival_time,
            input.note.as_deref(),
            user.user_id,
        )
        .await?;
    Ok(Json(DataResponse { data: record }))
}

/// POST /api/v1/attendance/{id}/confirm
pub async fn confirm(
    State(state): State<AppState>,
    RequireCurriculum(user): RequireCurriculum,
    Path(record_id): Path<DbId>,
    Json(input): Json<ConfirmRequest>,
) -> AppResult<Json<DataResponse<AttendanceRecord>>> {
    input.validate()?;
    let record = state
        .attendance
        .confirm(record_id, input.status, input.arrival_time, input.note.as_deref())
        .await?;
    tracing::debug!(record_id, confirmed_by = user.user_id, "Confirmation handled");
    Ok(Json(DataResponse { data: record }))
}

/// POST /api/v1/attendance/bulk-confirm
///
/// Always 200 once the batch itself is valid; per-id failures are reported
/// in `results`.
pub async fn bulk_confirm(
    State(state): State<AppState>,
    RequireCurriculum(user): RequireCurriculum,
    Json(input): Json<BulkConfirmRequest>,
) -> AppResult<Json<DataResponse<BulkConfirmOutcome>>> {
    input.validate()?;
    let outcome = state
        .attendance
        .bulk_confirm(&input.record_ids, input.status, input.note.as_deref())
        .await?;
    tracing::info!(
        confirmed_by = user.user_id,
        confirmed = outcome.confirmed,
        failed = outcome.failed,
        "Bulk confirmation handled"
    );
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/attendance/absences
pub async fn mark_absent(
    State(state): State<AppState>,
    RequireCurriculum(user): RequireCurriculum,
    Json(input): Json<MarkAbsentRequest>,
) -> AppResult<Json<DataResponse<AttendanceRecord>>> {
    let record = state
        .attendance
        .mark_absent(input.schedule_slot_id, input.date, user.user_id)
        .await?;
    Ok(Json(DataResponse { data: record }))
}

/// POST /api/v1/attendance/{id}/substitute
pub async fn assign_substitute(
    State(state): State<AppState>,
    RequireCurriculum(user): RequireCurriculum,
    Path(record_id): Path<DbId>,
    Json(input): Json<AssignSubstituteRequest>,
) -> AppResult<Json<DataResponse<AttendanceRecord>>> {
    input.validate()?;
    let record = state
        .attendance
        .assign_substitute(
            record_id,
            input.substitute_teacher_id,
            input.note.as_deref(),
            user.user_id,
        )
        .await?;
    Ok(Json(DataResponse { data: record }))
}

/// GET /api/v1/attendance/history
pub async fn history(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(params): Query<HistoryParams>,
) -> AppResult<Json<DataResponse<AttendanceHistoryPage>>> {
    let page = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };
    let filter = AttendanceHistoryFilter {
        start_date: params.start_date,
        end_date: params.end_date,
        teacher_id: params.teacher_id,
        class_section_id: params.class_section_id,
        status: params.status,
        limit: page.limit(),
        offset: page.offset(),
    };
    let history = state.attendance.history(&filter).await?;
    Ok(Json(DataResponse { data: history }))
}

/// GET /api/v1/attendance/statistics?year=&month=&teacher_id=
pub async fn statistics(
    State(state): State<AppState>,
    RequireCurriculum(_user): RequireCurriculum,
    Query(params): Query<StatisticsParams>,
) -> AppResult<Json<DataResponse<MonthlyStatistics>>> {
    params.validate()?;
    let stats = state
        .attendance
        .monthly_statistics(params.year, params.month, params.teacher_id)
        .await?;
    Ok(Json(DataResponse { data: stats }))
}

#[cfg(test)]
mod tests {
    use presensi_core::attendance::MAX_BULK_CONFIRM;

    use super::*;

    #[test]
    fn bulk_request_bounds_are_enforced_before_the_engine() {
        let empty = BulkConfirmRequest {
            record_ids: vec![],
            status: ConfirmStatus::Hadir,
            note: None,
        };
        assert!(empty.validate().is_err());

        let oversized = BulkConfirmRequest {
            record_ids: (1..=(MAX_BULK_CONFIRM as DbId + 1)).collect(),
            status: ConfirmStatus::Hadir,
            note: None,
        };
        assert!(oversized.validate().is_err());
    }

    #[test]
    fn long_notes_are_rejected() {
        let request = ConfirmRequest {
            status: ConfirmStatus::Telat,
            arrival_time: None,
            note: Some("x".repeat(501)),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn statistics_month_must_be_a_calendar_month() {
        let params = StatisticsParams {
            year: 2026,
            month: 13,
            teacher_id: None,
        };
        assert!(params.validate().is_err());
    }
}
