//! Domain rules for teacher attendance and substitution.
//!
//! This crate has no I/O and no internal dependencies so the state machines,
//! calendar expansion, and validation rules can be shared by the repository,
//! engine, and API layers alike.

pub mod attendance;
pub mod availability;
pub mod calendar;
pub mod error;
pub mod leave;
pub mod roles;
pub mod statistics;
pub mod types;
