//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that take
//! a Postgres executor as the first argument: `&PgPool` for standalone
//! queries, `&mut *tx` inside a transaction.

pub mod attendance_repo;
pub mod leave_repo;
pub mod lookup_repo;
pub mod schedule_slot_repo;
pub mod user_repo;

pub use attendance_repo::AttendanceRepo;
pub use leave_repo::LeaveRepo;
pub use lookup_repo::LookupRepo;
pub use schedule_slot_repo::ScheduleSlotRepo;
pub use user_repo::UserRepo;
