//! Class sections and subjects, used for grouping and display only.

use presensi_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `class_sections` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ClassSection {
    pub id: DbId,
    pub name: String,
    pub grade_level: Option<i16>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `subjects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Subject {
    pub id: DbId,
    pub name: String,
    pub code: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
