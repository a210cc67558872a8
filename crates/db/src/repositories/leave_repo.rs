//! Repository for the `leave_requests` table.
//!
//! Edits, withdrawals and decisions are compare-and-set on
//! `status = 'pending'`; zero affected rows means the request was already
//! decided (or never existed).

use chrono::NaiveDate;
use presensi_core::types::DbId;
use sqlx::{Executor, Postgres};

use crate::models::leave::{
    LeaveListFilter, LeaveRequest, LeaveRequestDetail, LeaveRequestInput, LeaveStatusCounts,
};

/// Column list for leave_requests queries.
const COLUMNS: &str = "id, teacher_id, reason, custom_reason, start_date, end_date, \
    substitute_teacher_id, status, rejection_reason, approved_by, approved_at, created_by, \
    created_at, updated_at";

/// Joined projection for [`LeaveRequestDetail`].
const DETAIL_SELECT: &str = "SELECT l.id, l.teacher_id, l.reason, l.custom_reason, l.start_date, \
    l.end_date, l.substitute_teacher_id, l.status, l.rejection_reason, l.approved_by, \
    l.approved_at, l.created_by, l.created_at, l.updated_at, \
    t.name AS teacher_name, s.name AS substitute_teacher_name, a.name AS approved_by_name, \
    (l.end_date - l.start_date + 1) AS duration_days \
    FROM leave_requests l \
    JOIN users t ON t.id = l.teacher_id \
    LEFT JOIN users s ON s.id = l.substitute_teacher_id \
    LEFT JOIN users a ON a.id = l.approved_by";

/// Shared filter for listing (status is `$1`) and counting.
const LIST_WHERE: &str = "WHERE ($1::TEXT IS NULL OR l.status = $1) \
    AND ($2::BIGINT IS NULL OR l.teacher_id = $2) \
    AND ($3::DATE IS NULL OR l.end_date >= $3) \
    AND ($4::DATE IS NULL OR l.start_date <= $4)";

pub struct LeaveRepo;

impl LeaveRepo {
    /// Insert a pending leave request.
    pub async fn create<'e, E>(
        executor: E,
        input: &LeaveRequestInput,
        created_by: DbId,
    ) -> Result<LeaveRequest, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "INSERT INTO leave_requests \
                (teacher_id, reason, custom_reason, start_date, end_date, substitute_teacher_id, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(input.teacher_id)
            .bind(input.reason.as_str())
            .bind(&input.custom_reason)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(input.substitute_teacher_id)
            .bind(created_by)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<LeaveRequest>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!("SELECT {COLUMNS} FROM leave_requests WHERE id = $1");
        sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_detail<'e, E>(executor: E, id: DbId) -> Result<Option<LeaveRequestDetail>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!("{DETAIL_SELECT} WHERE l.id = $1");
        sqlx::query_as::<_, LeaveRequestDetail>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Replace the editable fields of a pending request.
    ///
    /// Returns `None` if the request does not exist or is no longer pending.
    pub async fn update_pending<'e, E>(
        executor: E,
        id: DbId,
        input: &LeaveRequestInput,
    ) -> Result<Option<LeaveRequest>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "UPDATE leave_requests SET \
                reason = $2, custom_reason = $3, start_date = $4, end_date = $5, \
                substitute_teacher_id = $6 \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(id)
            .bind(input.reason.as_str())
            .bind(&input.custom_reason)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(input.substitute_teacher_id)
            .fetch_optional(executor)
            .await
    }

    /// Delete a pending request. Returns `true` if a row was removed.
    pub async fn delete_pending<'e, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM leave_requests WHERE id = $1 AND status = 'pending'")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Compare-and-set `pending -> approved`.
    pub async fn approve<'e, E>(
        executor: E,
        id: DbId,
        approver_id: DbId,
    ) -> Result<Option<LeaveRequest>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "UPDATE leave_requests SET status = 'approved', approved_by = $2, approved_at = NOW() \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(id)
            .bind(approver_id)
            .fetch_optional(executor)
            .await
    }

    /// Compare-and-set `pending -> rejected`.
    pub async fn reject<'e, E>(
        executor: E,
        id: DbId,
        approver_id: DbId,
        reason: &str,
    ) -> Result<Option<LeaveRequest>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "UPDATE leave_requests SET \
                status = 'rejected', rejection_reason = $3, approved_by = $2, approved_at = NOW() \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(id)
            .bind(approver_id)
            .bind(reason)
            .fetch_optional(executor)
            .await
    }

    /// Approved leaves of `teacher_id` overlapping `[start, end]`, other than
    /// `exclude_id`.
    pub async fn list_overlapping_approved<'e, E>(
        executor: E,
        teacher_id: DbId,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<DbId>,
    ) -> Result<Vec<LeaveRequest>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM leave_requests \
             WHERE teacher_id = $1 AND status = 'approved' \
               AND start_date <= $3 AND end_date >= $2 \
               AND ($4::BIGINT IS NULL OR id <> $4) \
             ORDER BY start_date ASC"
        );
        sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(teacher_id)
            .bind(start)
            .bind(end)
            .bind(exclude_id)
            .fetch_all(executor)
            .await
    }

    /// Approved leaves of any teacher covering `date`.
    pub async fn list_approved_covering<'e, E>(
        executor: E,
        date: NaiveDate,
    ) -> Result<Vec<LeaveRequest>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM leave_requests \
             WHERE status = 'approved' AND start_date <= $1 AND end_date >= $1"
        );
        sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(date)
            .fetch_all(executor)
            .await
    }

    /// Filtered listing, newest first.
    pub async fn list<'e, E>(
        executor: E,
        filter: &LeaveListFilter,
    ) -> Result<Vec<LeaveRequestDetail>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "{DETAIL_SELECT} {LIST_WHERE} \
             ORDER BY l.created_at DESC, l.id DESC \
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, LeaveRequestDetail>(&query)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.teacher_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(executor)
            .await
    }

    /// Per-status counts for the filter, ignoring its `status`.
    pub async fn count_by_status<'e, E>(
        executor: E,
        filter: &LeaveListFilter,
    ) -> Result<LeaveStatusCounts, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "SELECT COUNT(*) AS total, \
                    COUNT(*) FILTER (WHERE l.status = 'pending') AS pending, \
                    COUNT(*) FILTER (WHERE l.status = 'approved') AS approved, \
                    COUNT(*) FILTER (WHERE l.status = 'rejected') AS rejected \
             FROM leave_requests l {LIST_WHERE}"
        );
        sqlx::query_as::<_, LeaveStatusCounts>(&query)
            .bind(None::<&str>)
            .bind(filter.teacher_id)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_one(executor)
            .await
    }
}
