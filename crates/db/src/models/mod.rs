//! Row structs and insert/update DTOs.
//!
//! Status-like TEXT columns decode straight into the closed enums from
//! `presensi-core` via `#[sqlx(try_from = "String")]`.

pub mod attendance;
pub mod leave;
pub mod lookup;
pub mod schedule_slot;
pub mod user;
