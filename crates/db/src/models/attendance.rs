//! Attendance record rows and the joined views served to staff.

use chrono::{NaiveDate, NaiveTime};
use presensi_core::attendance::{validate_record_shape, AttendanceStatus};
use presensi_core::availability::{Engagement, PeriodWindow};
use presensi_core::calendar::DayOfWeek;
use presensi_core::error::CoreError;
use presensi_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `attendance_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceRecord {
    pub id: DbId,
    pub schedule_slot_id: DbId,
    pub date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
    pub arrival_time: Option<NaiveTime>,
    pub late_minutes: Option<i32>,
    pub acting_teacher_id: DbId,
    pub original_teacher_id: Option<DbId>,
    pub note: Option<String>,
    pub assigned_by: Option<DbId>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A record joined with its slot, class, subject and teacher names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: AttendanceRecord,
    #[sqlx(try_from = "String")]
    pub day_of_week: DayOfWeek,
    pub period: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room: Option<String>,
    pub class_section_id: DbId,
    pub class_section_name: String,
    pub subject_id: DbId,
    pub subject_name: String,
    /// The slot's nominal teacher.
    pub teacher_id: DbId,
    pub teacher_name: String,
    pub acting_teacher_name: String,
    pub original_teacher_name: Option<String>,
}

/// A record crediting a teacher on some date, with its slot timing.
#[derive(Debug, Clone, FromRow)]
pub struct EngagementRow {
    /// The acting teacher credited by the record.
    pub teacher_id: DbId,
    pub attendance_record_id: DbId,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
    pub schedule_slot_id: DbId,
    pub period: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl From<EngagementRow> for Engagement {
    fn from(row: EngagementRow) -> Self {
        Engagement {
            attendance_record_id: row.attendance_record_id,
            status: row.status,
            window: PeriodWindow {
                schedule_slot_id: row.schedule_slot_id,
                period: row.period,
                start_time: row.start_time,
                end_time: row.end_time,
            },
        }
    }
}

/// Grouped count used for monthly statistics.
#[derive(Debug, Clone, FromRow)]
pub struct StatusTallyRow {
    pub date: NaiveDate,
    pub teacher_id: DbId,
    pub teacher_name: String,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
    pub count: i64,
}

/// Fields written when a record is created or overwritten in one step.
#[derive(Debug, Clone)]
pub struct NewAttendanceRecord {
    pub schedule_slot_id: DbId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub arrival_time: Option<NaiveTime>,
    pub late_minutes: Option<i32>,
    pub acting_teacher_id: DbId,
    pub original_teacher_id: Option<DbId>,
    pub note: Option<String>,
    pub assigned_by: Option<DbId>,
    pub created_by: DbId,
}

impl NewAttendanceRecord {
    /// Check the status/late-minutes/original-teacher pairing before the
    /// row reaches the database constraints.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_record_shape(
            self.status,
            self.late_minutes,
            self.acting_teacher_id,
            self.original_teacher_id,
        )
    }
}

/// Filters for the attendance history listing.
#[derive(Debug, Clone, Default)]
pub struct AttendanceHistoryFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Matches either the acting or the original teacher.
    pub teacher_id: Option<DbId>,
    pub class_section_id: Option<DbId>,
    pub status: Option<AttendanceStatus>,
    pub limit: i64,
    pub offset: i64,
}
