//! Per-period attendance records and their lifecycle.
//!
//! A record exists per (schedule slot, date) and moves
//! `pending -> hadir | telat | tidak_hadir | diganti`, with `tidak_hadir`
//! still open to a substitute. Every write is a status-guarded statement;
//! when the guard misses, the record is re-read to report the state that
//! won.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use presensi_core::attendance::{
    resolve_confirmation, state_machine, validate_record_shape, AttendanceStatus, ConfirmStatus,
    MAX_BULK_CONFIRM,
};
use presensi_core::calendar::DayOfWeek;
use presensi_core::error::CoreError;
use presensi_core::roles::is_teaching_role;
use presensi_core::statistics::{self, MonthlyStatistics, StatusTally};
use presensi_core::types::DbId;
use presensi_db::models::attendance::{AttendanceDetail, AttendanceHistoryFilter, AttendanceRecord};
use presensi_db::models::schedule_slot::ScheduleSlot;
use presensi_db::repositories::{AttendanceRepo, ScheduleSlotRepo, UserRepo};
use presensi_db::DbPool;
use presensi_events::bus::SUBSTITUTE_ASSIGNED;
use presensi_events::{DomainEvent, EventBus};
use serde::Serialize;

use crate::availability::AvailabilityChecker;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::matcher::ensure_meets_on;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Outcome of one id in a bulk confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct PerItemResult {
    pub record_id: DbId,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<AttendanceRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ItemError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemError {
    pub code: &'static str,
    pub message: String,
}

impl From<&EngineError> for ItemError {
    fn from(err: &EngineError) -> Self {
        let message = match err {
            EngineError::Core(core) => core.to_string(),
            EngineError::Persistence(_) => "A database error occurred".to_string(),
        };
        Self {
            code: err.code(),
            message,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkConfirmOutcome {
    /// One entry per requested id, in request order.
    pub results: Vec<PerItemResult>,
    pub confirmed: usize,
    pub failed: usize,
}

/// Pending records of one class on the overview date.
#[derive(Debug, Clone, Serialize)]
pub struct PendingClassGroup {
    pub class_section_id: DbId,
    pub class_section_name: String,
    pub total_pending: usize,
    pub records: Vec<AttendanceDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingOverview {
    pub date: NaiveDate,
    /// Indonesian day name; `None` on Sundays.
    pub day: Option<&'static str>,
    pub total_pending: usize,
    pub grouped_by_class: Vec<PendingClassGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceHistoryPage {
    pub records: Vec<AttendanceDetail>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AttendanceEngine {
    pool: DbPool,
    events: Arc<EventBus>,
    config: EngineConfig,
}

impl AttendanceEngine {
    pub fn new(pool: DbPool, events: Arc<EventBus>, config: EngineConfig) -> Self {
        Self {
            pool,
            events,
            config,
        }
    }

    /// Confirm a pending record as `hadir` or `telat`.
    ///
    /// The arrival time is the one supplied, else the one stored by an
    /// arrival report. A `hadir` arriving past the grace period is stored
    /// as `telat`.
    pub async fn confirm(
        &self,
        record_id: DbId,
        status: ConfirmStatus,
        arrival_time: Option<NaiveTime>,
        note: Option<&str>,
    ) -> EngineResult<AttendanceRecord> {
        let record = self.require_record(record_id).await?;
        state_machine::validate_transition(record.id, record.status, status.into())?;

        let slot = self.require_slot(record.schedule_slot_id).await?;
        let arrival = arrival_time.or(record.arrival_time);
        let resolved = resolve_confirmation(
            status,
            slot.start_time,
            arrival,
            self.config.late_grace_minutes,
        );
        validate_record_shape(
            resolved.status,
            resolved.late_minutes,
            record.acting_teacher_id,
            record.original_teacher_id,
        )?;

        let updated = AttendanceRepo::confirm_pending(
            &self.pool,
            record.id,
            resolved.status,
            resolved.late_minutes,
            arrival,
            note,
        )
        .await?;

        match updated {
            Some(updated) => {
                tracing::info!(
                    record_id,
                    status = %updated.status,
                    late_minutes = updated.late_minutes,
                    "Attendance confirmed"
                );
                Ok(updated)
            }
            None => Err(self.lost_race(record_id, resolved.status).await),
        }
    }

    /// Confirm many records independently.
    ///
    /// Ids are processed in order, so a repeated id fails the second time
    /// with an invalid transition. Only an empty or oversized batch fails
    /// the call as a whole.
    pub async fn bulk_confirm(
        &self,
        record_ids: &[DbId],
        status: ConfirmStatus,
        note: Option<&str>,
    ) -> EngineResult<BulkConfirmOutcome> {
        if record_ids.is_empty() {
            return Err(CoreError::Validation("record_ids must not be empty".into()).into());
        }
        if record_ids.len() > MAX_BULK_CONFIRM {
            return Err(CoreError::Validation(format!(
                "At most {MAX_BULK_CONFIRM} records can be confirmed at once, got {}",
                record_ids.len()
            ))
            .into());
        }

        let mut results = Vec::with_capacity(record_ids.len());
        for &record_id in record_ids {
            let result = match self.confirm(record_id, status, None, note).await {
                Ok(record) => PerItemResult {
                    record_id,
                    ok: true,
                    record: Some(record),
                    error: None,
                },
                Err(err) => {
                    if let EngineError::Persistence(e) = &err {
                        tracing::error!(record_id, error = %e, "Bulk confirm item failed");
                    }
                    PerItemResult {
                        record_id,
                        ok: false,
                        record: None,
                        error: Some(ItemError::from(&err)),
                    }
                }
            };
            results.push(result);
        }

        let confirmed = results.iter().filter(|r| r.ok).count();
        let failed = results.len() - confirmed;
        tracing::info!(requested = record_ids.len(), confirmed, failed, "Bulk confirm finished");

        Ok(BulkConfirmOutcome {
            results,
            confirmed,
            failed,
        })
    }

    /// Record that the slot's teacher did not show up on `date`.
    ///
    /// A record that is already past pending is returned unchanged.
    pub async fn mark_absent(
        &self,
        schedule_slot_id: DbId,
        date: NaiveDate,
        marked_by: DbId,
    ) -> EngineResult<AttendanceRecord> {
        let slot = self.require_slot(schedule_slot_id).await?;
        ensure_meets_on(&slot, date)?;

        if let Some(record) =
            AttendanceRepo::upsert_absent(&self.pool, slot.id, date, slot.teacher_id, marked_by).await?
        {
            tracing::info!(record_id = record.id, schedule_slot_id, %date, "Teacher marked absent");
            return Ok(record);
        }

        let existing = AttendanceRepo::find_by_slot_and_date(&self.pool, slot.id, date)
            .await?
            .ok_or_else(|| CoreError::Conflict("Attendance record changed concurrently".into()))?;
        if !existing.status.is_final() {
            return Err(CoreError::Conflict("Attendance record changed concurrently".into()).into());
        }
        tracing::debug!(
            record_id = existing.id,
            status = %existing.status,
            "Absence not recorded, record already settled"
        );
        Ok(existing)
    }

    /// Register that the slot's teacher arrived, creating the pending
    /// record if needed.
    pub async fn report_arrival(
        &self,
        schedule_slot_id: DbId,
        date: NaiveDate,
        arrival_time: Option<NaiveTime>,
        note: Option<&str>,
        reported_by: DbId,
    ) -> EngineResult<AttendanceRecord> {
        let slot = self.require_slot(schedule_slot_id).await?;
        ensure_meets_on(&slot, date)?;

        let upserted = AttendanceRepo::upsert_arrival(
            &self.pool,
            slot.id,
            date,
            slot.teacher_id,
            arrival_time,
            note,
            reported_by,
        )
        .await?;
        if let Some(record) = upserted {
            tracing::info!(record_id = record.id, schedule_slot_id, %date, "Arrival reported");
            return Ok(record);
        }

        let existing = AttendanceRepo::find_by_slot_and_date(&self.pool, slot.id, date)
            .await?
            .ok_or_else(|| CoreError::Conflict("Attendance record changed concurrently".into()))?;
        Err(CoreError::InvalidTransition {
            entity: "AttendanceRecord",
            id: existing.id,
            from: existing.status.to_string(),
            to: AttendanceStatus::Pending.to_string(),
        }
        .into())
    }

    /// Hand a pending or absent period to a substitute.
    ///
    /// The substitute's row is locked and availability re-checked inside the
    /// transaction. Existing `diganti` bookings count against them, so two
    /// assignments for overlapping periods cannot both succeed.
    pub async fn assign_substitute(
        &self,
        record_id: DbId,
        substitute_teacher_id: DbId,
        note: Option<&str>,
        assigned_by: DbId,
    ) -> EngineResult<AttendanceRecord> {
        let mut tx = self.pool.begin().await?;

        let record = AttendanceRepo::find_by_id(&mut *tx, record_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "AttendanceRecord",
                id: record_id,
            })?;
        state_machine::validate_transition(record.id, record.status, AttendanceStatus::Diganti)?;

        let slot = ScheduleSlotRepo::find_detail(&mut *tx, record.schedule_slot_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "ScheduleSlot",
                id: record.schedule_slot_id,
            })?;
        validate_record_shape(
            AttendanceStatus::Diganti,
            None,
            substitute_teacher_id,
            Some(slot.slot.teacher_id),
        )?;

        let substitute = UserRepo::find_by_id(&mut *tx, substitute_teacher_id)
            .await?
            .ok_or_else(|| {
                CoreError::Validation(format!("Teacher {substitute_teacher_id} does not exist"))
            })?;
        if !substitute.is_active || !is_teaching_role(&substitute.role) {
            return Err(CoreError::InvalidSubstitute(format!(
                "{} cannot act as a substitute teacher",
                substitute.name
            ))
            .into());
        }

        UserRepo::lock_for_update(&mut *tx, substitute_teacher_id).await?;
        if let Some(reason) =
            AvailabilityChecker::explain(&mut *tx, substitute_teacher_id, record.date, &slot.slot.window())
                .await?
        {
            return Err(CoreError::InvalidSubstitute(format!(
                "{} is not available on {} period {}: {}",
                substitute.name,
                record.date,
                slot.slot.period,
                reason
            ))
            .into());
        }

        let updated = AttendanceRepo::assign_substitute(
            &mut *tx,
            record.id,
            substitute_teacher_id,
            slot.slot.teacher_id,
            note,
            assigned_by,
        )
        .await?;
        let Some(updated) = updated else {
            drop(tx);
            return Err(self.lost_race(record_id, AttendanceStatus::Diganti).await);
        };
        tx.commit().await?;

        tracing::info!(
            record_id,
            substitute_teacher_id,
            original_teacher_id = slot.slot.teacher_id,
            "Substitute assigned"
        );
        self.events.publish(
            DomainEvent::new(SUBSTITUTE_ASSIGNED)
                .with_source("attendance_record", updated.id)
                .with_actor(assigned_by)
                .with_payload(serde_json::json!({
                    "substitute_teacher_id": substitute_teacher_id,
                    "teacher_id": slot.slot.teacher_id,
                    "teacher_name": slot.teacher_name,
                    "class_section_name": slot.class_section_name,
                    "subject_name": slot.subject_name,
                    "date": updated.date,
                    "start_time": slot.slot.start_time.format("%H:%M").to_string(),
                    "end_time": slot.slot.end_time.format("%H:%M").to_string(),
                })),
        );
        Ok(updated)
    }

    /// Pending records on `date`, grouped by class.
    pub async fn pending_overview(
        &self,
        date: NaiveDate,
        class_section_id: Option<DbId>,
    ) -> EngineResult<PendingOverview> {
        let records = AttendanceRepo::list_pending(&self.pool, date, class_section_id).await?;
        let total_pending = records.len();

        let mut grouped_by_class: Vec<PendingClassGroup> = Vec::new();
        for record in records {
            match grouped_by_class.last_mut() {
                Some(group) if group.class_section_id == record.class_section_id => {
                    group.records.push(record);
                }
                _ => grouped_by_class.push(PendingClassGroup {
                    class_section_id: record.class_section_id,
                    class_section_name: record.class_section_name.clone(),
                    total_pending: 0,
                    records: vec![record],
                }),
            }
        }
        for group in &mut grouped_by_class {
            group.total_pending = group.records.len();
        }

        Ok(PendingOverview {
            date,
            day: DayOfWeek::of_date(date).map(|d| d.indonesian_name()),
            total_pending,
            grouped_by_class,
        })
    }

    pub async fn history(&self, filter: &AttendanceHistoryFilter) -> EngineResult<AttendanceHistoryPage> {
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            if end < start {
                return Err(CoreError::Validation(format!(
                    "end_date {end} is before start_date {start}"
                ))
                .into());
            }
        }
        let records = AttendanceRepo::list_history(&self.pool, filter).await?;
        let total = AttendanceRepo::count_history(&self.pool, filter).await?;
        Ok(AttendanceHistoryPage {
            records,
            total,
            limit: filter.limit,
            offset: filter.offset,
        })
    }

    /// Status totals for a calendar month, optionally for one teacher.
    pub async fn monthly_statistics(
        &self,
        year: i32,
        month: u32,
        teacher_id: Option<DbId>,
    ) -> EngineResult<MonthlyStatistics> {
        let (first, last) = statistics::month_bounds(year, month)
            .ok_or_else(|| CoreError::Validation(format!("Invalid month {year}-{month}")))?;

        let tallies: Vec<StatusTally> = AttendanceRepo::status_tallies(&self.pool, first, last, teacher_id)
            .await?
            .into_iter()
            .map(|row| StatusTally {
                date: row.date,
                teacher_id: row.teacher_id,
                teacher_name: row.teacher_name,
                status: row.status,
                count: row.count,
            })
            .collect();

        Ok(statistics::aggregate(year, month, &tallies))
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn require_record(&self, id: DbId) -> EngineResult<AttendanceRecord> {
        AttendanceRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "AttendanceRecord",
                id,
            })
            .map_err(Into::into)
    }

    async fn require_slot(&self, id: DbId) -> EngineResult<ScheduleSlot> {
        ScheduleSlotRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "ScheduleSlot",
                id,
            })
            .map_err(Into::into)
    }

    /// Explain a guarded write that matched no row.
    async fn lost_race(&self, record_id: DbId, to: AttendanceStatus) -> EngineError {
        match AttendanceRepo::find_by_id(&self.pool, record_id).await {
            Ok(Some(current)) => CoreError::InvalidTransition {
                entity: "AttendanceRecord",
                id: record_id,
                from: current.status.to_string(),
                to: to.to_string(),
            }
            .into(),
            Ok(None) => CoreError::NotFound {
                entity: "AttendanceRecord",
                id: record_id,
            }
            .into(),
            Err(e) => e.into(),
        }
    }
}
