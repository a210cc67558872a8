//! Leave request (izin) lifecycle rules.
//!
//! A leave request is editable while `pending` and then terminally
//! `approved` or `rejected`. Validation here is pure; checks that need the
//! database (overlapping approved leaves, settled attendance occurrences)
//! live in the engine.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::inclusive_span_days;
use crate::error::CoreError;
use crate::types::DbId;

/// Longest leave, in calendar days counting both ends.
pub const MAX_LEAVE_DAYS: i64 = 30;

/// Maximum length of a free-text reason when `reason` is `other`.
pub const MAX_CUSTOM_REASON_LEN: usize = 255;

/// Maximum length of a rejection reason.
pub const MAX_REJECTION_REASON_LEN: usize = 500;

// ---------------------------------------------------------------------------
// Reason
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveReason {
    Sick,
    Annual,
    Family,
    Official,
    Other,
}

impl LeaveReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sick => "sick",
            Self::Annual => "annual",
            Self::Family => "family",
            Self::Official => "official",
            Self::Other => "other",
        }
    }

    /// Human-readable label used in notifications and attendance notes.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sick => "Sakit",
            Self::Annual => "Cuti Tahunan",
            Self::Family => "Urusan Keluarga",
            Self::Official => "Acara Resmi",
            Self::Other => "Lainnya",
        }
    }
}

impl fmt::Display for LeaveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaveReason {
    type Err = CoreError;

    /// Accepts the storage names and the legacy Indonesian codes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sick" | "sakit" => Ok(Self::Sick),
            "annual" | "cuti_tahunan" => Ok(Self::Annual),
            "family" | "urusan_keluarga" => Ok(Self::Family),
            "official" | "acara_resmi" => Ok(Self::Official),
            "other" | "lainnya" => Ok(Self::Other),
            other => Err(CoreError::Validation(format!(
                "Invalid leave reason '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for LeaveReason {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaveStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(CoreError::Validation(format!(
                "Invalid leave status '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for LeaveStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// The user-editable part of a leave request.
#[derive(Debug, Clone)]
pub struct LeaveDraft {
    pub teacher_id: DbId,
    pub reason: LeaveReason,
    pub custom_reason: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub substitute_teacher_id: Option<DbId>,
}

/// Validate a draft, returning the normalized custom reason to store.
///
/// Checks, in order: date order, duration, self-substitution, and the
/// custom-reason rule (required iff `reason` is `other`).
pub fn validate_draft(draft: &LeaveDraft) -> Result<Option<String>, CoreError> {
    if draft.end_date < draft.start_date {
        return Err(CoreError::Validation(format!(
            "end_date {} is before start_date {}",
            draft.end_date, draft.start_date
        )));
    }

    let days = inclusive_span_days(draft.start_date, draft.end_date);
    if days > MAX_LEAVE_DAYS {
        return Err(CoreError::DurationExceeded {
            days,
            max: MAX_LEAVE_DAYS,
        });
    }

    if draft.substitute_teacher_id == Some(draft.teacher_id) {
        return Err(CoreError::InvalidSubstitute(
            "substitute_teacher_id must differ from teacher_id".into(),
        ));
    }

    let custom = draft
        .custom_reason
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match (draft.reason, custom) {
        (LeaveReason::Other, None) => Err(CoreError::Validation(
            "custom_reason is required when reason is 'other'".into(),
        )),
        (LeaveReason::Other, Some(text)) if text.chars().count() > MAX_CUSTOM_REASON_LEN => {
            Err(CoreError::Validation(format!(
                "custom_reason must be at most {MAX_CUSTOM_REASON_LEN} characters"
            )))
        }
        (LeaveReason::Other, Some(text)) => Ok(Some(text.to_string())),
        (_, Some(_)) => Err(CoreError::Validation(
            "custom_reason is only allowed when reason is 'other'".into(),
        )),
        (_, None) => Ok(None),
    }
}

/// Fail with [`CoreError::AlreadyProcessed`] unless the leave is pending.
pub fn ensure_pending(id: DbId, status: LeaveStatus) -> Result<(), CoreError> {
    if status.is_terminal() {
        return Err(CoreError::AlreadyProcessed {
            entity: "LeaveRequest",
            id,
            status: status.to_string(),
        });
    }
    Ok(())
}

/// Trim and validate a rejection reason.
pub fn validate_rejection_reason(reason: &str) -> Result<String, CoreError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "A rejection reason is required".into(),
        ));
    }
    if trimmed.chars().count() > MAX_REJECTION_REASON_LEN {
        return Err(CoreError::Validation(format!(
            "Rejection reason must be at most {MAX_REJECTION_REASON_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Note written on attendance records created by an approval cascade.
pub fn substitution_note(teacher_name: &str, reason: LeaveReason, custom: Option<&str>) -> String {
    match custom {
        Some(text) => format!("Pengganti {teacher_name} - Izin: {} ({text})", reason.label()),
        None => format!("Pengganti {teacher_name} - Izin: {}", reason.label()),
    }
}
