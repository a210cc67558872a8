//! Leave request workflow.
//!
//! `pending -> approved | rejected`. Approval runs in one transaction that
//! flips the status, re-checks conflicts and writes one attendance record
//! per concrete occurrence of the teacher's slots inside the leave range.
//! Notifications go out only after commit.

use std::sync::Arc;

use chrono::NaiveDate;
use presensi_core::attendance::AttendanceStatus;
use presensi_core::calendar::occurrences_in_range;
use presensi_core::error::CoreError;
use presensi_core::leave::{
    ensure_pending, substitution_note, validate_draft, validate_rejection_reason, LeaveDraft,
    LeaveReason, LeaveStatus,
};
use presensi_core::roles::is_teaching_role;
use presensi_core::types::DbId;
use presensi_db::models::attendance::NewAttendanceRecord;
use presensi_db::models::leave::{
    LeaveListFilter, LeaveRequest, LeaveRequestDetail, LeaveRequestInput, LeaveStatusCounts,
};
use presensi_db::models::user::{TeacherRef, User};
use presensi_db::repositories::{AttendanceRepo, LeaveRepo, ScheduleSlotRepo, UserRepo};
use presensi_db::DbPool;
use presensi_events::bus::{LEAVE_APPROVED, LEAVE_REJECTED, LEAVE_SUBMITTED};
use presensi_events::{DomainEvent, EventBus};
use serde::Serialize;
use sqlx::PgConnection;

use crate::availability::AvailabilityChecker;
use crate::error::{EngineError, EngineResult};

/// Editable fields of a pending leave request.
#[derive(Debug, Clone)]
pub struct LeaveChanges {
    pub reason: LeaveReason,
    pub custom_reason: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub substitute_teacher_id: Option<DbId>,
}

/// An occurrence the approval cascade left alone because its outcome was
/// already recorded.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedOccurrence {
    pub schedule_slot_id: DbId,
    pub date: NaiveDate,
    pub status: Option<AttendanceStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalOutcome {
    pub leave: LeaveRequest,
    /// Occurrences now recorded as `diganti`.
    pub substituted: usize,
    /// Occurrences left `pending` for lack of a substitute.
    pub left_pending: usize,
    pub skipped: Vec<SkippedOccurrence>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaveListPage {
    pub leaves: Vec<LeaveRequestDetail>,
    /// Requests matching the filter.
    pub total: i64,
    /// Per-status counts over the filter, ignoring its status.
    pub counts: LeaveStatusCounts,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Clone)]
pub struct LeaveWorkflow {
    pool: DbPool,
    events: Arc<EventBus>,
}

impl LeaveWorkflow {
    pub fn new(pool: DbPool, events: Arc<EventBus>) -> Self {
        Self { pool, events }
    }

    /// Validate and store a new pending leave request.
    pub async fn submit(&self, draft: LeaveDraft, created_by: DbId) -> EngineResult<LeaveRequest> {
        let mut conn = self.pool.acquire().await?;
        let input = validate_request(&mut conn, &draft, None).await?;

        let leave = LeaveRepo::create(&mut *conn, &input, created_by).await?;
        tracing::info!(
            leave_id = leave.id,
            teacher_id = leave.teacher_id,
            start_date = %leave.start_date,
            end_date = %leave.end_date,
            "Leave request submitted"
        );
        self.events.publish(
            DomainEvent::new(LEAVE_SUBMITTED)
                .with_source("leave_request", leave.id)
                .with_actor(created_by)
                .with_payload(serde_json::json!({ "teacher_id": leave.teacher_id })),
        );
        Ok(leave)
    }

    /// Edit a request while it is still pending.
    pub async fn update(&self, leave_id: DbId, changes: LeaveChanges) -> EngineResult<LeaveRequest> {
        let mut conn = self.pool.acquire().await?;
        let existing = require_leave(&mut conn, leave_id).await?;
        ensure_pending(existing.id, existing.status)?;

        let draft = LeaveDraft {
            teacher_id: existing.teacher_id,
            reason: changes.reason,
            custom_reason: changes.custom_reason,
            start_date: changes.start_date,
            end_date: changes.end_date,
            substitute_teacher_id: changes.substitute_teacher_id,
        };
        let input = validate_request(&mut conn, &draft, Some(leave_id)).await?;

        match LeaveRepo::update_pending(&mut *conn, leave_id, &input).await? {
            Some(updated) => {
                tracing::info!(leave_id, "Leave request updated");
                Ok(updated)
            }
            None => Err(lost_decision(&mut conn, leave_id).await),
        }
    }

    /// Delete a request while it is still pending.
    pub async fn withdraw(&self, leave_id: DbId) -> EngineResult<()> {
        let mut conn = self.pool.acquire().await?;
        let existing = require_leave(&mut conn, leave_id).await?;
        ensure_pending(existing.id, existing.status)?;

        if !LeaveRepo::delete_pending(&mut *conn, leave_id).await? {
            return Err(lost_decision(&mut conn, leave_id).await);
        }
        tracing::info!(leave_id, "Leave request withdrawn");
        Ok(())
    }

    /// Approve a pending request and cascade it onto the timetable.
    ///
    /// With a substitute, every occurrence of the teacher's slots in the
    /// range becomes `diganti` unless its outcome is already recorded.
    /// Without one, a `pending` record is created for each occurrence so it
    /// surfaces in the pending queue. Any failure rolls back the whole
    /// approval.
    pub async fn approve(&self, leave_id: DbId, approver_id: DbId) -> EngineResult<ApprovalOutcome> {
        let mut tx = self.pool.begin().await?;

        let existing = require_leave(&mut tx, leave_id).await?;
        ensure_pending(existing.id, existing.status)?;

        // Serializes approvals for the same teacher.
        UserRepo::lock_for_update(&mut *tx, existing.teacher_id).await?;

        let Some(leave) = LeaveRepo::approve(&mut *tx, leave_id, approver_id).await? else {
            return Err(lost_decision(&mut tx, leave_id).await);
        };

        let overlapping = LeaveRepo::list_overlapping_approved(
            &mut *tx,
            leave.teacher_id,
            leave.start_date,
            leave.end_date,
            Some(leave.id),
        )
        .await?;
        if let Some(other) = overlapping.first() {
            return Err(CoreError::ScheduleConflict(format!(
                "Leave overlaps approved leave #{} ({} to {})",
                other.id, other.start_date, other.end_date
            ))
            .into());
        }

        let teacher = require_user(&mut tx, leave.teacher_id).await?;
        let substitute = match leave.substitute_teacher_id {
            Some(id) => {
                let substitute = require_user(&mut tx, id).await?;
                ensure_can_substitute(&substitute)?;
                UserRepo::lock_for_update(&mut *tx, id).await?;
                Some(substitute)
            }
            None => None,
        };

        let note = substitution_note(&teacher.name, leave.reason, leave.custom_reason.as_deref());
        let mut outcome = ApprovalOutcome {
            leave: leave.clone(),
            substituted: 0,
            left_pending: 0,
            skipped: Vec::new(),
        };

        for slot in ScheduleSlotRepo::list_by_teacher(&mut *tx, leave.teacher_id).await? {
            for date in occurrences_in_range(slot.day_of_week, leave.start_date, leave.end_date) {
                let written = match &substitute {
                    Some(substitute) => {
                        if let Some(reason) =
                            AvailabilityChecker::explain(&mut tx, substitute.id, date, &slot.window())
                                .await?
                        {
                            return Err(CoreError::InvalidSubstitute(format!(
                                "{} is not available on {} period {}: {}",
                                substitute.name, date, slot.period, reason
                            ))
                            .into());
                        }
                        let record = NewAttendanceRecord {
                            schedule_slot_id: slot.id,
                            date,
                            status: AttendanceStatus::Diganti,
                            arrival_time: None,
                            late_minutes: None,
                            acting_teacher_id: substitute.id,
                            original_teacher_id: Some(teacher.id),
                            note: Some(note.clone()),
                            assigned_by: Some(approver_id),
                            created_by: approver_id,
                        };
                        record.validate()?;
                        let written = AttendanceRepo::upsert_substitution(&mut *tx, &record).await?;
                        if written.is_some() {
                            outcome.substituted += 1;
                        }
                        written
                    }
                    None => {
                        let record = NewAttendanceRecord {
                            schedule_slot_id: slot.id,
                            date,
                            status: AttendanceStatus::Pending,
                            arrival_time: None,
                            late_minutes: None,
                            acting_teacher_id: teacher.id,
                            original_teacher_id: None,
                            note: Some(note.clone()),
                            assigned_by: None,
                            created_by: approver_id,
                        };
                        record.validate()?;
                        let written = AttendanceRepo::insert_if_missing(&mut *tx, &record).await?;
                        if written.is_some() {
                            outcome.left_pending += 1;
                        }
                        written
                    }
                };

                if written.is_none() {
                    let current = AttendanceRepo::find_by_slot_and_date(&mut *tx, slot.id, date).await?;
                    let status = current.map(|r| r.status);
                    tracing::debug!(
                        leave_id,
                        schedule_slot_id = slot.id,
                        %date,
                        ?status,
                        "Occurrence already recorded, left unchanged"
                    );
                    outcome.skipped.push(SkippedOccurrence {
                        schedule_slot_id: slot.id,
                        date,
                        status,
                    });
                }
            }
        }

        tx.commit().await?;

        tracing::info!(
            leave_id,
            approver_id,
            teacher_id = teacher.id,
            substitute_teacher_id = leave.substitute_teacher_id,
            substituted = outcome.substituted,
            left_pending = outcome.left_pending,
            skipped = outcome.skipped.len(),
            "Leave request approved"
        );
        self.events.publish(
            DomainEvent::new(LEAVE_APPROVED)
                .with_source("leave_request", leave.id)
                .with_actor(approver_id)
                .with_payload(serde_json::json!({
                    "teacher_id": teacher.id,
                    "teacher_name": teacher.name,
                    "substitute_teacher_id": substitute.as_ref().map(|s| s.id),
                    "substitute_teacher_name": substitute.as_ref().map(|s| s.name.clone()),
                    "start_date": leave.start_date,
                    "end_date": leave.end_date,
                    "reason_label": leave.reason.label(),
                    "substituted_periods": outcome.substituted,
                })),
        );
        Ok(outcome)
    }

    /// Reject a pending request with a reason shown to the teacher.
    pub async fn reject(
        &self,
        leave_id: DbId,
        approver_id: DbId,
        reason: &str,
    ) -> EngineResult<LeaveRequest> {
        let reason = validate_rejection_reason(reason)?;
        let mut conn = self.pool.acquire().await?;

        let existing = require_leave(&mut conn, leave_id).await?;
        ensure_pending(existing.id, existing.status)?;

        let Some(leave) = LeaveRepo::reject(&mut *conn, leave_id, approver_id, &reason).await? else {
            return Err(lost_decision(&mut conn, leave_id).await);
        };

        tracing::info!(leave_id, approver_id, teacher_id = leave.teacher_id, "Leave request rejected");
        self.events.publish(
            DomainEvent::new(LEAVE_REJECTED)
                .with_source("leave_request", leave.id)
                .with_actor(approver_id)
                .with_payload(serde_json::json!({
                    "teacher_id": leave.teacher_id,
                    "start_date": leave.start_date,
                    "end_date": leave.end_date,
                    "rejection_reason": reason,
                })),
        );
        Ok(leave)
    }

    pub async fn get(&self, leave_id: DbId) -> EngineResult<LeaveRequestDetail> {
        LeaveRepo::find_detail(&self.pool, leave_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "LeaveRequest",
                id: leave_id,
            })
            .map_err(Into::into)
    }

    pub async fn list(&self, filter: &LeaveListFilter) -> EngineResult<LeaveListPage> {
        let leaves = LeaveRepo::list(&self.pool, filter).await?;
        let counts = LeaveRepo::count_by_status(&self.pool, filter).await?;
        let total = match filter.status {
            None => counts.total,
            Some(LeaveStatus::Pending) => counts.pending,
            Some(LeaveStatus::Approved) => counts.approved,
            Some(LeaveStatus::Rejected) => counts.rejected,
        };
        Ok(LeaveListPage {
            leaves,
            total,
            counts,
            limit: filter.limit,
            offset: filter.offset,
        })
    }

    /// Teachers with no approved leave overlapping `[start_date, end_date]`,
    /// for picking a substitute on the leave form.
    pub async fn substitute_candidates_for_range(
        &self,
        teacher_id: DbId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> EngineResult<Vec<TeacherRef>> {
        if end_date < start_date {
            return Err(CoreError::Validation(format!(
                "end_date {end_date} is before start_date {start_date}"
            ))
            .into());
        }
        Ok(UserRepo::list_free_for_range(&self.pool, teacher_id, start_date, end_date).await?)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Run every check a submitted or edited request must pass, returning the
/// row to write.
async fn validate_request(
    conn: &mut PgConnection,
    draft: &LeaveDraft,
    exclude_id: Option<DbId>,
) -> EngineResult<LeaveRequestInput> {
    let custom_reason = validate_draft(draft)?;

    let teacher = UserRepo::find_by_id(&mut *conn, draft.teacher_id)
        .await?
        .ok_or_else(|| CoreError::Validation(format!("Teacher {} does not exist", draft.teacher_id)))?;
    if !is_teaching_role(&teacher.role) {
        return Err(CoreError::Validation(format!("{} is not a teacher", teacher.name)).into());
    }

    if let Some(substitute_id) = draft.substitute_teacher_id {
        let substitute = UserRepo::find_by_id(&mut *conn, substitute_id)
            .await?
            .ok_or_else(|| {
                CoreError::Validation(format!("Substitute teacher {substitute_id} does not exist"))
            })?;
        ensure_can_substitute(&substitute)?;
    }

    check_schedule_conflicts(conn, draft.teacher_id, draft.start_date, draft.end_date, exclude_id).await?;

    Ok(LeaveRequestInput {
        teacher_id: draft.teacher_id,
        reason: draft.reason,
        custom_reason,
        start_date: draft.start_date,
        end_date: draft.end_date,
        substitute_teacher_id: draft.substitute_teacher_id,
    })
}

/// A leave may not overlap another approved leave of the same teacher, nor
/// excuse an occurrence whose outcome is already recorded.
async fn check_schedule_conflicts(
    conn: &mut PgConnection,
    teacher_id: DbId,
    start_date: NaiveDate,
    end_date: NaiveDate,
    exclude_id: Option<DbId>,
) -> EngineResult<()> {
    let overlapping =
        LeaveRepo::list_overlapping_approved(&mut *conn, teacher_id, start_date, end_date, exclude_id)
            .await?;
    if let Some(other) = overlapping.first() {
        return Err(CoreError::ScheduleConflict(format!(
            "Leave overlaps approved leave #{} ({} to {})",
            other.id, other.start_date, other.end_date
        ))
        .into());
    }

    let slots = ScheduleSlotRepo::list_by_teacher(&mut *conn, teacher_id).await?;
    if slots.is_empty() {
        return Ok(());
    }
    let slot_ids: Vec<DbId> = slots.iter().map(|s| s.id).collect();
    let settled = AttendanceRepo::list_settled_for_slots(&mut *conn, &slot_ids, start_date, end_date).await?;

    for record in settled {
        let Some(slot) = slots.iter().find(|s| s.id == record.schedule_slot_id) else {
            continue;
        };
        if occurrences_in_range(slot.day_of_week, start_date, end_date).contains(&record.date) {
            return Err(CoreError::ScheduleConflict(format!(
                "{} period {} is already recorded as {}",
                record.date, slot.period, record.status
            ))
            .into());
        }
    }
    Ok(())
}

fn ensure_can_substitute(user: &User) -> Result<(), CoreError> {
    if user.is_active && is_teaching_role(&user.role) {
        return Ok(());
    }
    Err(CoreError::InvalidSubstitute(format!(
        "{} cannot act as a substitute teacher",
        user.name
    )))
}

async fn require_leave(conn: &mut PgConnection, id: DbId) -> EngineResult<LeaveRequest> {
    LeaveRepo::find_by_id(&mut *conn, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "LeaveRequest",
            id,
        })
        .map_err(Into::into)
}

async fn require_user(conn: &mut PgConnection, id: DbId) -> EngineResult<User> {
    UserRepo::find_by_id(&mut *conn, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "User", id })
        .map_err(Into::into)
}

/// Explain a status-guarded leave write that matched no row.
async fn lost_decision(conn: &mut PgConnection, leave_id: DbId) -> EngineError {
    match LeaveRepo::find_by_id(&mut *conn, leave_id).await {
        Ok(Some(current)) => match ensure_pending(current.id, current.status) {
            Err(e) => e.into(),
            Ok(()) => CoreError::Conflict(format!("Leave request {leave_id} changed concurrently")).into(),
        },
        Ok(None) => CoreError::NotFound {
            entity: "LeaveRequest",
            id: leave_id,
        }
        .into(),
        Err(e) => e.into(),
    }
}
