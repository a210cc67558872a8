//! Substitute candidate search for a single period.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use presensi_core::availability::{self, Engagement, LeaveWindow, ScheduledPeriod};
use presensi_core::calendar::DayOfWeek;
use presensi_core::error::CoreError;
use presensi_core::types::DbId;
use presensi_db::models::schedule_slot::ScheduleSlot;
use presensi_db::models::user::TeacherRef;
use presensi_db::repositories::{AttendanceRepo, LeaveRepo, ScheduleSlotRepo};
use presensi_db::DbPool;

use crate::error::EngineResult;
use crate::roster::RosterCache;

#[derive(Clone)]
pub struct SubstituteMatcher {
    pool: DbPool,
    roster: Arc<RosterCache>,
}

impl SubstituteMatcher {
    pub fn new(pool: DbPool, roster: Arc<RosterCache>) -> Self {
        Self { pool, roster }
    }

    /// Teachers who could take over `schedule_slot_id` on `date`.
    ///
    /// Starts from the cached roster (active, teaching roles), drops the
    /// slot's own teacher and `exclude_teacher_id`, then keeps only those
    /// that are available: not on leave, not already committed elsewhere in
    /// an overlapping period, and not due in their own class at that time. Ordered by name case-insensitively, then id. An
    /// empty list is a normal answer.
    pub async fn find_candidates(
        &self,
        schedule_slot_id: DbId,
        date: NaiveDate,
        exclude_teacher_id: Option<DbId>,
    ) -> EngineResult<Vec<TeacherRef>> {
        let slot = ScheduleSlotRepo::find_by_id(&self.pool, schedule_slot_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "ScheduleSlot",
                id: schedule_slot_id,
            })?;
        ensure_meets_on(&slot, date)?;

        let roster = self.roster.get_or_load(&self.pool).await?;

        let mut leaves: HashMap<DbId, Vec<LeaveWindow>> = HashMap::new();
        for leave in LeaveRepo::list_approved_covering(&self.pool, date).await? {
            leaves.entry(leave.teacher_id).or_default().push(leave.window());
        }
        let mut engagements: HashMap<DbId, Vec<Engagement>> = HashMap::new();
        for row in AttendanceRepo::list_engagements(&self.pool, date, None).await? {
            engagements.entry(row.teacher_id).or_default().push(row.into());
        }
        let mut scheduled: HashMap<DbId, Vec<ScheduledPeriod>> = HashMap::new();
        for row in ScheduleSlotRepo::list_scheduled_on(&self.pool, date, None).await? {
            scheduled.entry(row.teacher_id).or_default().push(row.into());
        }

        let target = slot.window();
        let mut candidates: Vec<TeacherRef> = roster
            .iter()
            .filter(|t| t.id != slot.teacher_id && Some(t.id) != exclude_teacher_id)
            .filter(|t| {
                let leaves = leaves.get(&t.id).map(Vec::as_slice).unwrap_or_default();
                let engagements = engagements.get(&t.id).map(Vec::as_slice).unwrap_or_default();
                let scheduled = scheduled.get(&t.id).map(Vec::as_slice).unwrap_or_default();
                availability::evaluate(date, &target, leaves, engagements, scheduled).is_none()
            })
            .cloned()
            .collect();
        candidates.sort_by_cached_key(|t| (t.name.to_lowercase(), t.id));

        tracing::debug!(
            schedule_slot_id,
            %date,
            candidates = candidates.len(),
            "Substitute candidates resolved"
        );
        Ok(candidates)
    }
}

/// Fail with a validation error unless `slot` meets on `date`'s weekday.
pub(crate) fn ensure_meets_on(slot: &ScheduleSlot, date: NaiveDate) -> Result<(), CoreError> {
    if DayOfWeek::of_date(date) == Some(slot.day_of_week) {
        return Ok(());
    }
    Err(CoreError::Validation(format!(
        "Schedule slot {} meets on {}, but {} is not a {}",
        slot.id,
        slot.day_of_week.indonesian_name(),
        date,
        slot.day_of_week,
    )))
}
