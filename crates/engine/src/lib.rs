//! The attendance and substitution engine.
//!
//! Each component owns its transaction boundaries and talks to PostgreSQL
//! through the `presensi-db` repositories:
//!
//! - [`AvailabilityChecker`]: is a teacher free for a period on a date?
//! - [`SubstituteMatcher`]: who could take over a period?
//! - [`AttendanceEngine`]: per-period attendance records and their lifecycle.
//! - [`LeaveWorkflow`]: leave submission, approval and the substitution
//!   cascade.
//!
//! State changes publish a [`DomainEvent`](presensi_events::DomainEvent)
//! after commit.

pub mod attendance;
pub mod availability;
pub mod config;
pub mod error;
pub mod leave;
pub mod matcher;
pub mod roster;

pub use attendance::AttendanceEngine;
pub use availability::AvailabilityChecker;
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use leave::LeaveWorkflow;
pub use matcher::SubstituteMatcher;
pub use roster::RosterCache;
