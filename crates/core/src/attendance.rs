//! Attendance status state machine and lateness rules.
//!
//! One attendance record exists per (schedule slot, calendar date). Records
//! start in [`AttendanceStatus::Pending`] and move forward only:
//!
//! ```text
//! pending ──► hadir
//!         ──► telat
//!         ──► tidak_hadir ──► diganti
//!         ──► diganti
//! ```
//!
//! `hadir`, `telat` and `diganti` are settled; `tidak_hadir` can still be
//! covered by assigning a substitute.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minutes after the period start during which a `hadir` confirmation stays
/// `hadir`. Later arrivals are recorded as `telat`.
pub const DEFAULT_LATE_GRACE_MINUTES: i64 = 5;

/// Maximum number of record ids accepted by a single bulk confirmation.
pub const MAX_BULK_CONFIRM: usize = 200;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Status of a teacher's attendance for one class period on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Not yet confirmed by curriculum staff.
    Pending,
    /// Present and on time.
    Hadir,
    /// Present but late.
    Telat,
    /// No-show without cover.
    TidakHadir,
    /// Covered by a substitute teacher.
    Diganti,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 5] = [
        AttendanceStatus::Pending,
        AttendanceStatus::Hadir,
        AttendanceStatus::Telat,
        AttendanceStatus::TidakHadir,
        AttendanceStatus::Diganti,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Hadir => "hadir",
            Self::Telat => "telat",
            Self::TidakHadir => "tidak_hadir",
            Self::Diganti => "diganti",
        }
    }

    /// Whether the occurrence's outcome is settled: the acting teacher is
    /// committed to the period and a leave cascade must not replace it.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Hadir | Self::Telat | Self::Diganti)
    }

    /// Statuses from which an absence marking is a no-op.
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "hadir" => Ok(Self::Hadir),
            "telat" => Ok(Self::Telat),
            "tidak_hadir" => Ok(Self::TidakHadir),
            "diganti" => Ok(Self::Diganti),
            other => Err(CoreError::Validation(format!(
                "Invalid attendance status '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for AttendanceStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The subset of statuses staff may pick when confirming a pending record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmStatus {
    Hadir,
    Telat,
}

impl From<ConfirmStatus> for AttendanceStatus {
    fn from(value: ConfirmStatus) -> Self {
        match value {
            ConfirmStatus::Hadir => AttendanceStatus::Hadir,
            ConfirmStatus::Telat => AttendanceStatus::Telat,
        }
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

pub mod state_machine {
    use super::AttendanceStatus::{self, *};
    use crate::error::CoreError;
    use crate::types::DbId;

    /// Statuses reachable from `from`.
    pub fn valid_transitions(from: AttendanceStatus) -> &'static [AttendanceStatus] {
        match from {
            Pending => &[Hadir, Telat, TidakHadir, Diganti],
            TidakHadir => &[Diganti],
            Hadir | Telat | Diganti => &[],
        }
    }

    pub fn can_transition(from: AttendanceStatus, to: AttendanceStatus) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a transition for record `id`, producing
    /// [`CoreError::InvalidTransition`] when illegal.
    pub fn validate_transition(
        id: DbId,
        from: AttendanceStatus,
        to: AttendanceStatus,
    ) -> Result<(), CoreError> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                entity: "AttendanceRecord",
                id,
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Lateness
// ---------------------------------------------------------------------------

/// Whole minutes between the period start and the arrival, clamped at zero.
pub fn late_minutes(start: NaiveTime, arrival: NaiveTime) -> i32 {
    let minutes = (arrival - start).num_minutes();
    minutes.max(0) as i32
}

/// Outcome of resolving a confirmation request against the slot's timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedConfirmation {
    pub status: AttendanceStatus,
    /// Present only when `status` is `telat`.
    pub late_minutes: Option<i32>,
}

/// Decide the final status and lateness of a confirmation.
///
/// - `telat` always stays `telat`; lateness is derived from the arrival time
///   (zero when no arrival is known or the teacher was early).
/// - `hadir` is upgraded to `telat` when the arrival is more than
///   `grace_minutes` after the period start.
pub fn resolve_confirmation(
    requested: ConfirmStatus,
    period_start: NaiveTime,
    arrival: Option<NaiveTime>,
    grace_minutes: i64,
) -> ResolvedConfirmation {
    let late = arrival.map(|a| late_minutes(period_start, a));
    match requested {
        ConfirmStatus::Telat => ResolvedConfirmation {
            status: AttendanceStatus::Telat,
            late_minutes: Some(late.unwrap_or(0)),
        },
        ConfirmStatus::Hadir => match late {
            Some(minutes) if i64::from(minutes) > grace_minutes => ResolvedConfirmation {
                status: AttendanceStatus::Telat,
                late_minutes: Some(minutes),
            },
            _ => ResolvedConfirmation {
                status: AttendanceStatus::Hadir,
                late_minutes: None,
            },
        },
    }
}

// ---------------------------------------------------------------------------
// Record shape
// ---------------------------------------------------------------------------

/// Check the cross-field invariants of an attendance record.
///
/// - `late_minutes` is present only for `telat` and never negative.
/// - `original_teacher_id` is present iff the status is `diganti`, and then
///   differs from the acting teacher.
pub fn validate_record_shape(
    status: AttendanceStatus,
    late_minutes: Option<i32>,
    acting_teacher_id: DbId,
    original_teacher_id: Option<DbId>,
) -> Result<(), CoreError> {
    match (status, late_minutes) {
        (AttendanceStatus::Telat, Some(m)) if m < 0 => {
            return Err(CoreError::Validation(
                "late_minutes must not be negative".into(),
            ))
        }
        (AttendanceStatus::Telat, _) => {}
        (_, Some(_)) => {
            return Err(CoreError::Validation(format!(
                "late_minutes is only allowed for telat, got status {status}"
            )))
        }
        (_, None) => {}
    }

    match (status, original_teacher_id) {
        (AttendanceStatus::Diganti, None) => Err(CoreError::Validation(
            "diganti records must name the original teacher".into(),
        )),
        (AttendanceStatus::Diganti, Some(original)) if original == acting_teacher_id => {
            Err(CoreError::InvalidSubstitute(
                "a teacher cannot substitute for themselves".into(),
            ))
        }
        (AttendanceStatus::Diganti, Some(_)) => Ok(()),
        (_, Some(_)) => Err(CoreError::Validation(format!(
            "original_teacher_id is only allowed for diganti, got status {status}"
        ))),
        (_, None) => Ok(()),
    }
}
