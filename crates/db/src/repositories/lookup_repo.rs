//! Repository for the `class_sections` and `subjects` lookup tables.

use presensi_core::types::DbId;
use sqlx::{Executor, Postgres};

use crate::models::lookup::{ClassSection, Subject};

const CLASS_SECTION_COLUMNS: &str = "id, name, grade_level, created_at, updated_at";
const SUBJECT_COLUMNS: &str = "id, name, code, created_at, updated_at";

pub struct LookupRepo;

impl LookupRepo {
    pub async fn create_class_section<'e, E>(
        executor: E,
        name: &str,
        grade_level: Option<i16>,
    ) -> Result<ClassSection, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "INSERT INTO class_sections (name, grade_level) VALUES ($1, $2) \
             RETURNING {CLASS_SECTION_COLUMNS}"
        );
        sqlx::query_as::<_, ClassSection>(&query)
            .bind(name)
            .bind(grade_level)
            .fetch_one(executor)
            .await
    }

    pub async fn find_class_section<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<ClassSection>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!("SELECT {CLASS_SECTION_COLUMNS} FROM class_sections WHERE id = $1");
        sqlx::query_as::<_, ClassSection>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn create_subject<'e, E>(
        executor: E,
        name: &str,
        code: Option<&str>,
    ) -> Result<Subject, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "INSERT INTO subjects (name, code) VALUES ($1, $2) RETURNING {SUBJECT_COLUMNS}"
        );
        sqlx::query_as::<_, Subject>(&query)
            .bind(name)
            .bind(code)
            .fetch_one(executor)
            .await
    }
}
