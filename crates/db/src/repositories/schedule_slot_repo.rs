//! Repository for the `schedule_slots` table.
//!
//! The timetable is read-only for the engine; `create` exists for seeding.

use chrono::NaiveDate;
use presensi_core::calendar::DayOfWeek;
use presensi_core::types::DbId;
use sqlx::{Executor, Postgres};

use crate::models::schedule_slot::{
    CreateScheduleSlot, ScheduleSlot, ScheduleSlotDetail, ScheduledPeriodRow,
};

/// Column list for schedule_slots queries.
const COLUMNS: &str = "id, teacher_id, day_of_week, period, subject_id, class_section_id, \
    start_time, end_time, room, created_at, updated_at";

/// Joined projection for [`ScheduleSlotDetail`].
const DETAIL_SELECT: &str = "SELECT s.id, s.teacher_id, s.day_of_week, s.period, s.subject_id, \
    s.class_section_id, s.start_time, s.end_time, s.room, s.created_at, s.updated_at, \
    u.name AS teacher_name, sub.name AS subject_name, c.name AS class_section_name \
    FROM schedule_slots s \
    JOIN users u ON u.id = s.teacher_id \
    JOIN subjects sub ON sub.id = s.subject_id \
    JOIN class_sections c ON c.id = s.class_section_id";

/// Orders `day_of_week` Monday first.
const DAY_ORDER: &str =
    "array_position(ARRAY['monday','tuesday','wednesday','thursday','friday','saturday'], s.day_of_week)";

pub struct ScheduleSlotRepo;

impl ScheduleSlotRepo {
    pub async fn create<'e, E>(executor: E, input: &CreateScheduleSlot) -> Result<ScheduleSlot, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "INSERT INTO schedule_slots \
                (teacher_id, day_of_week, period, subject_id, class_section_id, start_time, end_time, room) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScheduleSlot>(&query)
            .bind(input.teacher_id)
            .bind(input.day_of_week.as_str())
            .bind(input.period)
            .bind(input.subject_id)
            .bind(input.class_section_id)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(&input.room)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<ScheduleSlot>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!("SELECT {COLUMNS} FROM schedule_slots WHERE id = $1");
        sqlx::query_as::<_, ScheduleSlot>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_detail<'e, E>(executor: E, id: DbId) -> Result<Option<ScheduleSlotDetail>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!("{DETAIL_SELECT} WHERE s.id = $1");
        sqlx::query_as::<_, ScheduleSlotDetail>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// All weekly slots taught by a teacher, Monday first, then by period.
    pub async fn list_by_teacher<'e, E>(executor: E, teacher_id: DbId) -> Result<Vec<ScheduleSlot>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM schedule_slots s WHERE s.teacher_id = $1 \
             ORDER BY {DAY_ORDER} ASC, s.period ASC"
        );
        sqlx::query_as::<_, ScheduleSlot>(&query)
            .bind(teacher_id)
            .fetch_all(executor)
            .await
    }

    /// Slots meeting on the weekday of `date`, optionally for one class,
    /// ordered by class name then start time. Sundays have no slots.
    pub async fn list_by_date_and_filter<'e, E>(
        executor: E,
        date: NaiveDate,
        class_section_id: Option<DbId>,
    ) -> Result<Vec<ScheduleSlotDetail>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let Some(day) = DayOfWeek::of_date(date) else {
            return Ok(Vec::new());
        };
        let query = format!(
            "{DETAIL_SELECT} \
             WHERE s.day_of_week = $1 AND ($2::BIGINT IS NULL OR s.class_section_id = $2) \
             ORDER BY c.name ASC, s.start_time ASC, s.id ASC"
        );
        sqlx::query_as::<_, ScheduleSlotDetail>(&query)
            .bind(day.as_str())
            .bind(class_section_id)
            .fetch_all(executor)
            .await
    }

    /// Slots meeting on `date`'s weekday with their teacher, flagging those
    /// whose occurrence that day is already `diganti`. `teacher_id = None`
    /// covers every teacher.
    pub async fn list_scheduled_on<'e, E>(
        executor: E,
        date: NaiveDate,
        teacher_id: Option<DbId>,
    ) -> Result<Vec<ScheduledPeriodRow>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let Some(day) = DayOfWeek::of_date(date) else {
            return Ok(Vec::new());
        };
        sqlx::query_as::<_, ScheduledPeriodRow>(
            "SELECT s.teacher_id, s.id AS schedule_slot_id, s.period, s.start_time, s.end_time, \
                    COALESCE(r.status = 'diganti', FALSE) AS handed_over \
             FROM schedule_slots s \
             LEFT JOIN attendance_records r ON r.schedule_slot_id = s.id AND r.date = $2 \
             WHERE s.day_of_week = $1 AND ($3::BIGINT IS NULL OR s.teacher_id = $3)",
        )
        .bind(day.as_str())
        .bind(date)
        .bind(teacher_id)
        .fetch_all(executor)
        .await
    }
}
