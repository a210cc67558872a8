//! Repository for the `users` table: the teacher roster.

use chrono::NaiveDate;
use presensi_core::roles::TEACHING_ROLES;
use presensi_core::types::DbId;
use sqlx::{Executor, Postgres};

use crate::models::user::{CreateUser, TeacherRef, User};

/// Column list for users queries.
const COLUMNS: &str = "id, name, nip, email, role, is_active, created_at, updated_at";

/// Column list for [`TeacherRef`] projections.
const REF_COLUMNS: &str = "u.id, u.name, u.nip, u.email, u.role";

pub struct UserRepo;

impl UserRepo {
    /// Insert a user, returning the created row.
    pub async fn create<'e, E>(executor: E, input: &CreateUser) -> Result<User, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "INSERT INTO users (name, nip, email, role) VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.name)
            .bind(&input.nip)
            .bind(&input.email)
            .bind(&input.role)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<User>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Activate or deactivate a user. Returns `true` if a row was updated.
    pub async fn set_active<'e, E>(executor: E, id: DbId, is_active: bool) -> Result<bool, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("UPDATE users SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Take a row lock on a user for the rest of the transaction.
    ///
    /// Serializes leave approvals for the same teacher. Returns `false` if
    /// the user does not exist.
    pub async fn lock_for_update<'e, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row: Option<(DbId,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row.is_some())
    }

    /// Active users holding a teaching role, ordered by name
    /// (case-insensitive) then id.
    pub async fn list_eligible_substitutes<'e, E>(executor: E) -> Result<Vec<TeacherRef>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "SELECT {REF_COLUMNS} FROM users u \
             WHERE u.is_active AND u.role = ANY($1) \
             ORDER BY LOWER(u.name) ASC, u.id ASC"
        );
        sqlx::query_as::<_, TeacherRef>(&query)
            .bind(TEACHING_ROLES)
            .fetch_all(executor)
            .await
    }

    /// Eligible substitutes with no approved leave overlapping
    /// `[start_date, end_date]`, excluding `exclude_id`.
    pub async fn list_free_for_range<'e, E>(
        executor: E,
        exclude_id: DbId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<TeacherRef>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "SELECT {REF_COLUMNS} FROM users u \
             WHERE u.is_active AND u.role = ANY($1) AND u.id <> $2 \
               AND NOT EXISTS ( \
                   SELECT 1 FROM leave_requests l \
                   WHERE l.teacher_id = u.id AND l.status = 'approved' \
                     AND l.start_date <= $4 AND l.end_date >= $3 \
               ) \
             ORDER BY LOWER(u.name) ASC, u.id ASC"
        );
        sqlx::query_as::<_, TeacherRef>(&query)
            .bind(TEACHING_ROLES)
            .bind(exclude_id)
            .bind(start_date)
            .bind(end_date)
            .fetch_all(executor)
            .await
    }
}
