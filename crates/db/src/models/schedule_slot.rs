//! Weekly timetable rows.

use chrono::NaiveTime;
use presensi_core::availability::{PeriodWindow, ScheduledPeriod};
use presensi_core::calendar::DayOfWeek;
use presensi_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `schedule_slots` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScheduleSlot {
    pub id: DbId,
    pub teacher_id: DbId,
    #[sqlx(try_from = "String")]
    pub day_of_week: DayOfWeek,
    pub period: i32,
    pub subject_id: DbId,
    pub class_section_id: DbId,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ScheduleSlot {
    pub fn window(&self) -> PeriodWindow {
        PeriodWindow {
            schedule_slot_id: self.id,
            period: self.period,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// A slot joined with its teacher, subject and class names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScheduleSlotDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub slot: ScheduleSlot,
    pub teacher_name: String,
    pub subject_name: String,
    pub class_section_name: String,
}

/// A slot meeting on some date, and whether that occurrence has already
/// been handed to a substitute.
#[derive(Debug, Clone, FromRow)]
pub struct ScheduledPeriodRow {
    pub teacher_id: DbId,
    pub schedule_slot_id: DbId,
    pub period: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub handed_over: bool,
}

impl From<ScheduledPeriodRow> for ScheduledPeriod {
    fn from(row: ScheduledPeriodRow) -> Self {
        ScheduledPeriod {
            window: PeriodWindow {
                schedule_slot_id: row.schedule_slot_id,
                period: row.period,
                start_time: row.start_time,
                end_time: row.end_time,
            },
            handed_over: row.handed_over,
        }
    }
}

/// DTO for inserting a slot (the timetable itself is maintained elsewhere).
#[derive(Debug, Clone)]
pub struct CreateScheduleSlot {
    pub teacher_id: DbId,
    pub day_of_week: DayOfWeek,
    pub period: i32,
    pub subject_id: DbId,
    pub class_section_id: DbId,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room: Option<String>,
}
