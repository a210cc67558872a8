//! Availability checks against live data.
//!
//! The rule itself is [`presensi_core::availability::evaluate`]; this module
//! loads its inputs. Checks take a connection so they can run inside the
//! transaction that acts on the answer.

use chrono::NaiveDate;
use presensi_core::availability::{
    self, Engagement, LeaveWindow, PeriodWindow, ScheduledPeriod, Unavailability,
};
use presensi_core::types::DbId;
use presensi_db::repositories::{AttendanceRepo, LeaveRepo, ScheduleSlotRepo};
use sqlx::PgConnection;

pub struct AvailabilityChecker;

impl AvailabilityChecker {
    /// Why `teacher_id` cannot take `target` on `date`, or `None` if free.
    pub async fn explain(
        conn: &mut PgConnection,
        teacher_id: DbId,
        date: NaiveDate,
        target: &PeriodWindow,
    ) -> Result<Option<Unavailability>, sqlx::Error> {
        let leaves: Vec<LeaveWindow> =
            LeaveRepo::list_overlapping_approved(&mut *conn, teacher_id, date, date, None)
                .await?
                .iter()
                .map(|leave| leave.window())
                .collect();
        let engagements: Vec<Engagement> =
            AttendanceRepo::list_engagements(&mut *conn, date, Some(teacher_id))
                .await?
                .into_iter()
                .map(Engagement::from)
                .collect();

        let scheduled: Vec<ScheduledPeriod> =
            ScheduleSlotRepo::list_scheduled_on(&mut *conn, date, Some(teacher_id))
                .await?
                .into_iter()
                .map(ScheduledPeriod::from)
                .collect();

        Ok(availability::evaluate(date, target, &leaves, &engagements, &scheduled))
    }

    /// Whether `teacher_id` is free for `target` on `date`. Errors propagate,
    /// so a failed lookup never reads as "available".
    pub async fn is_available(
        conn: &mut PgConnection,
        teacher_id: DbId,
        date: NaiveDate,
        target: &PeriodWindow,
    ) -> Result<bool, sqlx::Error> {
        Ok(Self::explain(conn, teacher_id, date, target).await?.is_none())
    }
}
