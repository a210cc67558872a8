//! Leave request rows and DTOs.

use chrono::NaiveDate;
use presensi_core::availability::LeaveWindow;
use presensi_core::leave::{LeaveReason, LeaveStatus};
use presensi_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `leave_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LeaveRequest {
    pub id: DbId,
    pub teacher_id: DbId,
    #[sqlx(try_from = "String")]
    pub reason: LeaveReason,
    pub custom_reason: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub substitute_teacher_id: Option<DbId>,
    #[sqlx(try_from = "String")]
    pub status: LeaveStatus,
    pub rejection_reason: Option<String>,
    pub approved_by: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LeaveRequest {
    pub fn window(&self) -> LeaveWindow {
        LeaveWindow {
            leave_id: self.id,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// A leave request joined with the names of the people involved.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LeaveRequestDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub leave: LeaveRequest,
    pub teacher_name: String,
    pub substitute_teacher_name: Option<String>,
    pub approved_by_name: Option<String>,
    /// Calendar days covered, both ends included.
    pub duration_days: i32,
}

/// Validated fields for inserting or editing a pending leave request.
#[derive(Debug, Clone)]
pub struct LeaveRequestInput {
    pub teacher_id: DbId,
    pub reason: LeaveReason,
    pub custom_reason: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub substitute_teacher_id: Option<DbId>,
}

/// Filters for listing leave requests.
#[derive(Debug, Clone, Default)]
pub struct LeaveListFilter {
    pub status: Option<LeaveStatus>,
    pub teacher_id: Option<DbId>,
    /// Keep requests overlapping `[from, to]`.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: i64,
    pub offset: i64,
}

/// Number of leave requests per status.
#[derive(Debug, Clone, Copy, Default, FromRow, Serialize)]
pub struct LeaveStatusCounts {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}
