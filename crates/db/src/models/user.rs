//! Roster rows from the `users` table.

use serde::Serialize;
use sqlx::FromRow;
use presensi_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub nip: Option<String>,
    pub email: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The slice of a user needed to list or notify a teacher.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct TeacherRef {
    pub id: DbId,
    pub name: String,
    pub nip: Option<String>,
    pub email: Option<String>,
    pub role: String,
}

impl From<User> for TeacherRef {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            nip: user.nip,
            email: user.email,
            role: user.role,
        }
    }
}

/// DTO for inserting a user (roster CRUD lives elsewhere; used by seeding
/// and tests).
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub nip: Option<String>,
    pub email: Option<String>,
    pub role: String,
}
