//! Repository for the `attendance_records` table.
//!
//! Every state change is a single status-guarded statement: an `UPDATE`
//! (or `ON CONFLICT DO UPDATE`) whose `WHERE` clause names the statuses the
//! transition may start from. A `None` return means the guard did not match;
//! callers re-read the row to report why.

use chrono::{NaiveDate, NaiveTime};
use presensi_core::attendance::AttendanceStatus;
use presensi_core::types::DbId;
use sqlx::{Executor, Postgres};

use crate::models::attendance::{
    AttendanceDetail, AttendanceHistoryFilter, AttendanceRecord, EngagementRow,
    NewAttendanceRecord, StatusTallyRow,
};

/// Column list for attendance_records queries.
const COLUMNS: &str = "id, schedule_slot_id, date, status, arrival_time, late_minutes, \
    acting_teacher_id, original_teacher_id, note, assigned_by, created_by, created_at, updated_at";

/// Joined projection for [`AttendanceDetail`].
const DETAIL_SELECT: &str = "SELECT r.id, r.schedule_slot_id, r.date, r.status, r.arrival_time, \
    r.late_minutes, r.acting_teacher_id, r.original_teacher_id, r.note, r.assigned_by, \
    r.created_by, r.created_at, r.updated_at, \
    s.day_of_week, s.period, s.start_time, s.end_time, s.room, \
    s.class_section_id, c.name AS class_section_name, \
    s.subject_id, sub.name AS subject_name, \
    s.teacher_id, t.name AS teacher_name, \
    a.name AS acting_teacher_name, o.name AS original_teacher_name \
    FROM attendance_records r \
    JOIN schedule_slots s ON s.id = r.schedule_slot_id \
    JOIN class_sections c ON c.id = s.class_section_id \
    JOIN subjects sub ON sub.id = s.subject_id \
    JOIN users t ON t.id = s.teacher_id \
    JOIN users a ON a.id = r.acting_teacher_id \
    LEFT JOIN users o ON o.id = r.original_teacher_id";

/// Shared `WHERE` clause for history listing and counting.
const HISTORY_WHERE: &str = "WHERE ($1::DATE IS NULL OR r.date >= $1) \
    AND ($2::DATE IS NULL OR r.date <= $2) \
    AND ($3::BIGINT IS NULL OR r.acting_teacher_id = $3 OR r.original_teacher_id = $3) \
    AND ($4::BIGINT IS NULL OR s.class_section_id = $4) \
    AND ($5::TEXT IS NULL OR r.status = $5)";

pub struct AttendanceRepo;

impl AttendanceRepo {
    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<AttendanceRecord>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!("SELECT {COLUMNS} FROM attendance_records WHERE id = $1");
        sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_slot_and_date<'e, E>(
        executor: E,
        schedule_slot_id: DbId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM attendance_records WHERE schedule_slot_id = $1 AND date = $2"
        );
        sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(schedule_slot_id)
            .bind(date)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_detail<'e, E>(executor: E, id: DbId) -> Result<Option<AttendanceDetail>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!("{DETAIL_SELECT} WHERE r.id = $1");
        sqlx::query_as::<_, AttendanceDetail>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Pending records on `date`, optionally for one class, ordered by class
    /// name then period start.
    pub async fn list_pending<'e, E>(
        executor: E,
        date: NaiveDate,
        class_section_id: Option<DbId>,
    ) -> Result<Vec<AttendanceDetail>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "{DETAIL_SELECT} \
             WHERE r.date = $1 AND r.status = 'pending' \
               AND ($2::BIGINT IS NULL OR s.class_section_id = $2) \
             ORDER BY c.name ASC, s.start_time ASC, r.id ASC"
        );
        sqlx::query_as::<_, AttendanceDetail>(&query)
            .bind(date)
            .bind(class_section_id)
            .fetch_all(executor)
            .await
    }

    /// Records on the given slots within `[start, end]` whose outcome is
    /// settled (`hadir`, `telat` or `diganti`).
    pub async fn list_settled_for_slots<'e, E>(
        executor: E,
        schedule_slot_ids: &[DbId],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM attendance_records \
             WHERE schedule_slot_id = ANY($1) AND date BETWEEN $2 AND $3 \
               AND status IN ('hadir', 'telat', 'diganti') \
             ORDER BY date ASC, schedule_slot_id ASC"
        );
        sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(schedule_slot_ids)
            .bind(start)
            .bind(end)
            .fetch_all(executor)
            .await
    }

    /// Records on `date` that commit their acting teacher to the period
    /// (`hadir`, `telat`, or `diganti` for a booked substitute), with their
    /// slot timing. `teacher_id = None` returns engagements for every
    /// teacher.
    pub async fn list_engagements<'e, E>(
        executor: E,
        date: NaiveDate,
        teacher_id: Option<DbId>,
    ) -> Result<Vec<EngagementRow>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, EngagementRow>(
            "SELECT r.acting_teacher_id AS teacher_id, r.id AS attendance_record_id, r.status, \
                    s.id AS schedule_slot_id, s.period, s.start_time, s.end_time \
             FROM attendance_records r \
             JOIN schedule_slots s ON s.id = r.schedule_slot_id \
             WHERE r.date = $1 AND r.status IN ('hadir', 'telat', 'diganti') \
               AND ($2::BIGINT IS NULL OR r.acting_teacher_id = $2)",
        )
        .bind(date)
        .bind(teacher_id)
        .fetch_all(executor)
        .await
    }

    /// Filtered history, newest first.
    pub async fn list_history<'e, E>(
        executor: E,
        filter: &AttendanceHistoryFilter,
    ) -> Result<Vec<AttendanceDetail>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "{DETAIL_SELECT} {HISTORY_WHERE} \
             ORDER BY r.date DESC, s.start_time DESC, r.id DESC \
             LIMIT $6 OFFSET $7"
        );
        sqlx::query_as::<_, AttendanceDetail>(&query)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(filter.teacher_id)
            .bind(filter.class_section_id)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(executor)
            .await
    }

    /// Total rows matching the history filter, ignoring limit/offset.
    pub async fn count_history<'e, E>(
        executor: E,
        filter: &AttendanceHistoryFilter,
    ) -> Result<i64, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "SELECT COUNT(*) FROM attendance_records r \
             JOIN schedule_slots s ON s.id = r.schedule_slot_id \
             {HISTORY_WHERE}"
        );
        sqlx::query_scalar::<_, i64>(&query)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(filter.teacher_id)
            .bind(filter.class_section_id)
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_one(executor)
            .await
    }

    /// Records in `[start, end]` grouped by date, acting teacher and status.
    pub async fn status_tallies<'e, E>(
        executor: E,
        start: NaiveDate,
        end: NaiveDate,
        teacher_id: Option<DbId>,
    ) -> Result<Vec<StatusTallyRow>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, StatusTallyRow>(
            "SELECT r.date, r.acting_teacher_id AS teacher_id, u.name AS teacher_name, \
                    r.status, COUNT(*) AS count \
             FROM attendance_records r \
             JOIN users u ON u.id = r.acting_teacher_id \
             WHERE r.date BETWEEN $1 AND $2 \
               AND ($3::BIGINT IS NULL OR r.acting_teacher_id = $3 OR r.original_teacher_id = $3) \
             GROUP BY r.date, r.acting_teacher_id, u.name, r.status \
             ORDER BY r.date ASC",
        )
        .bind(start)
        .bind(end)
        .bind(teacher_id)
        .fetch_all(executor)
        .await
    }

    // -----------------------------------------------------------------------
    // Guarded writes
    // -----------------------------------------------------------------------

    /// Create a pending record carrying the arrival report, or refresh the
    /// arrival time and note of an existing pending one.
    ///
    /// Returns `None` when a record exists and is no longer pending.
    pub async fn upsert_arrival<'e, E>(
        executor: E,
        schedule_slot_id: DbId,
        date: NaiveDate,
        acting_teacher_id: DbId,
        arrival_time: Option<NaiveTime>,
        note: Option<&str>,
        created_by: DbId,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "INSERT INTO attendance_records \
                (schedule_slot_id, date, status, arrival_time, acting_teacher_id, note, created_by) \
             VALUES ($1, $2, 'pending', $3, $4, $5, $6) \
             ON CONFLICT (schedule_slot_id, date) DO UPDATE SET \
                arrival_time = COALESCE(EXCLUDED.arrival_time, attendance_records.arrival_time), \
                note = COALESCE(EXCLUDED.note, attendance_records.note) \
             WHERE attendance_records.status = 'pending' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(schedule_slot_id)
            .bind(date)
            .bind(arrival_time)
            .bind(acting_teacher_id)
            .bind(note)
            .bind(created_by)
            .fetch_optional(executor)
            .await
    }

    /// Move a pending record to `hadir` or `telat`.
    ///
    /// Returns `None` if the record does not exist or is not pending.
    pub async fn confirm_pending<'e, E>(
        executor: E,
        id: DbId,
        status: AttendanceStatus,
        late_minutes: Option<i32>,
        arrival_time: Option<NaiveTime>,
        note: Option<&str>,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "UPDATE attendance_records SET \
                status = $2, late_minutes = $3, \
                arrival_time = COALESCE($4, arrival_time), \
                note = COALESCE($5, note) \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(late_minutes)
            .bind(arrival_time)
            .bind(note)
            .fetch_optional(executor)
            .await
    }

    /// Record a no-show: insert a `tidak_hadir` record, or move an existing
    /// pending one to `tidak_hadir`.
    ///
    /// Returns `None` when the existing record is past pending.
    pub async fn upsert_absent<'e, E>(
        executor: E,
        schedule_slot_id: DbId,
        date: NaiveDate,
        acting_teacher_id: DbId,
        created_by: DbId,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "INSERT INTO attendance_records \
                (schedule_slot_id, date, status, acting_teacher_id, created_by) \
             VALUES ($1, $2, 'tidak_hadir', $3, $4) \
             ON CONFLICT (schedule_slot_id, date) DO UPDATE SET status = 'tidak_hadir' \
             WHERE attendance_records.status = 'pending' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(schedule_slot_id)
            .bind(date)
            .bind(acting_teacher_id)
            .bind(created_by)
            .fetch_optional(executor)
            .await
    }

    /// Hand an uncovered record (`pending` or `tidak_hadir`) to a substitute.
    ///
    /// Returns `None` if the record does not exist or is already settled.
    pub async fn assign_substitute<'e, E>(
        executor: E,
        id: DbId,
        substitute_teacher_id: DbId,
        original_teacher_id: DbId,
        note: Option<&str>,
        assigned_by: DbId,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "UPDATE attendance_records SET \
                status = 'diganti', acting_teacher_id = $2, original_teacher_id = $3, \
                arrival_time = NULL, late_minutes = NULL, note = COALESCE($4, note), \
                assigned_by = $5 \
             WHERE id = $1 AND status IN ('pending', 'tidak_hadir') \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(id)
            .bind(substitute_teacher_id)
            .bind(original_teacher_id)
            .bind(note)
            .bind(assigned_by)
            .fetch_optional(executor)
            .await
    }

    /// Write the `diganti` record for one occurrence covered by an approved
    /// leave. Idempotent on `(schedule_slot_id, date)`; overwrites only
    /// `pending` and `tidak_hadir` rows.
    ///
    /// Returns `None` when the occurrence was already settled.
    pub async fn upsert_substitution<'e, E>(
        executor: E,
        input: &NewAttendanceRecord,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "INSERT INTO attendance_records \
                (schedule_slot_id, date, status, arrival_time, late_minutes, acting_teacher_id, \
                 original_teacher_id, note, assigned_by, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (schedule_slot_id, date) DO UPDATE SET \
                status = EXCLUDED.status, \
                arrival_time = NULL, \
                late_minutes = EXCLUDED.late_minutes, \
                acting_teacher_id = EXCLUDED.acting_teacher_id, \
                original_teacher_id = EXCLUDED.original_teacher_id, \
                note = EXCLUDED.note, \
                assigned_by = EXCLUDED.assigned_by \
             WHERE attendance_records.status IN ('pending', 'tidak_hadir') \
             RETURNING {COLUMNS}"
        );
        Self::bind_new(&query, input).fetch_optional(executor).await
    }

    /// Insert a record unless one already exists for the occurrence.
    ///
    /// Returns `None` when a record was already present.
    pub async fn insert_if_missing<'e, E>(
        executor: E,
        input: &NewAttendanceRecord,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "INSERT INTO attendance_records \
                (schedule_slot_id, date, status, arrival_time, late_minutes, acting_teacher_id, \
                 original_teacher_id, note, assigned_by, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (schedule_slot_id, date) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        Self::bind_new(&query, input).fetch_optional(executor).await
    }

    fn bind_new<'q>(
        query: &'q str,
        input: &'q NewAttendanceRecord,
    ) -> sqlx::query::QueryAs<'q, Postgres, AttendanceRecord, sqlx::postgres::PgArguments> {
        sqlx::query_as::<_, AttendanceRecord>(query)
            .bind(input.schedule_slot_id)
            .bind(input.date)
            .bind(input.status.as_str())
            .bind(input.arrival_time)
            .bind(input.late_minutes)
            .bind(input.acting_teacher_id)
            .bind(input.original_teacher_id)
            .bind(&input.note)
            .bind(input.assigned_by)
            .bind(input.created_by)
    }
}
