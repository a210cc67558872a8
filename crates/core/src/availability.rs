//! Teacher availability rules.
//!
//! A teacher is unavailable for a (date, period) when an approved leave
//! covers the date, when on that date an overlapping period of another slot
//! already credits them as acting teacher (confirmed present or booked as a
//! substitute), or when one of their own slots meets in an overlapping
//! period and has not been handed to someone else. The engine loads the
//! relevant leaves, engagements and slots; the decision itself lives here.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::attendance::AttendanceStatus;
use crate::calendar::time_ranges_overlap;
use crate::types::DbId;

/// The timing of a schedule slot, as far as overlap checks care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    pub schedule_slot_id: DbId,
    pub period: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl PeriodWindow {
    /// Same period ordinal, or intersecting `[start, end)` intervals.
    pub fn overlaps(&self, other: &PeriodWindow) -> bool {
        self.period == other.period
            || time_ranges_overlap(self.start_time, self.end_time, other.start_time, other.end_time)
    }
}

/// An approved leave of the teacher under consideration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveWindow {
    pub leave_id: DbId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl LeaveWindow {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// An attendance record on the target date that credits the teacher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Engagement {
    pub attendance_record_id: DbId,
    pub status: AttendanceStatus,
    pub window: PeriodWindow,
}

/// One of the teacher's own weekly slots meeting on the target date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledPeriod {
    pub window: PeriodWindow,
    /// The occurrence on the target date is already `diganti`.
    pub handed_over: bool,
}

/// Why a teacher cannot take a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Unavailability {
    OnLeave { leave_id: DbId },
    TeachingElsewhere {
        attendance_record_id: DbId,
        schedule_slot_id: DbId,
    },
    SubstitutingElsewhere {
        attendance_record_id: DbId,
        schedule_slot_id: DbId,
    },
    ScheduledToTeach { schedule_slot_id: DbId },
}

impl fmt::Display for Unavailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnLeave { leave_id } => write!(f, "on approved leave #{leave_id}"),
            Self::TeachingElsewhere {
                schedule_slot_id, ..
            } => write!(f, "already teaching schedule slot {schedule_slot_id}"),
            Self::SubstitutingElsewhere {
                schedule_slot_id, ..
            } => write!(f, "already substituting in schedule slot {schedule_slot_id}"),
            Self::ScheduledToTeach { schedule_slot_id } => {
                write!(f, "scheduled to teach schedule slot {schedule_slot_id}")
            }
        }
    }
}

/// Decide whether a teacher is free for `target` on `date`.
///
/// Checked in order: an approved leave covering the date (whether or not any
/// attendance record exists), a settled record crediting the teacher in an
/// overlapping period, then the teacher's own overlapping slots that are not
/// yet handed over. Anything on the target slot itself is ignored.
pub fn evaluate(
    date: NaiveDate,
    target: &PeriodWindow,
    leaves: &[LeaveWindow],
    engagements: &[Engagement],
    scheduled: &[ScheduledPeriod],
) -> Option<Unavailability> {
    if let Some(leave) = leaves.iter().find(|l| l.covers(date)) {
        return Some(Unavailability::OnLeave {
            leave_id: leave.leave_id,
        });
    }

    let engaged = engagements
        .iter()
        .filter(|e| e.window.schedule_slot_id != target.schedule_slot_id)
        .filter(|e| e.status.is_settled())
        .find(|e| e.window.overlaps(target));
    if let Some(e) = engaged {
        let attendance_record_id = e.attendance_record_id;
        let schedule_slot_id = e.window.schedule_slot_id;
        return Some(if e.status == AttendanceStatus::Diganti {
            Unavailability::SubstitutingElsewhere {
                attendance_record_id,
                schedule_slot_id,
            }
        } else {
            Unavailability::TeachingElsewhere {
                attendance_record_id,
                schedule_slot_id,
            }
        });
    }

    scheduled
        .iter()
        .filter(|p| p.window.schedule_slot_id != target.schedule_slot_id)
        .filter(|p| !p.handed_over)
        .find(|p| p.window.overlaps(target))
        .map(|p| Unavailability::ScheduledToTeach {
            schedule_slot_id: p.window.schedule_slot_id,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn window(slot: DbId, period: i32, start: NaiveTime, end: NaiveTime) -> PeriodWindow {
        PeriodWindow {
            schedule_slot_id: slot,
            period,
            start_time: start,
            end_time: end,
        }
    }

    fn third_period() -> PeriodWindow {
        window(10, 3, t(8, 30), t(9, 15))
    }

    #[test]
    fn free_teacher_is_available() {
        assert_eq!(evaluate(d(9), &third_period(), &[], &[], &[]), None);
    }

    #[test]
    fn approved_leave_blocks_without_any_record() {
        let leaves = [LeaveWindow {
            leave_id: 4,
            start_date: d(9),
            end_date: d(11),
        }];
        assert_eq!(
            evaluate(d(10), &third_period(), &leaves, &[], &[]),
            Some(Unavailability::OnLeave { leave_id: 4 })
        );
        assert_eq!(evaluate(d(12), &third_period(), &leaves, &[], &[]), None);
    }

    #[test]
    fn confirmed_teaching_in_overlapping_period_blocks() {
        let engagements = [Engagement {
            attendance_record_id: 77,
            status: AttendanceStatus::Hadir,
            window: window(20, 3, t(8, 30), t(9, 15)),
        }];
        assert_eq!(
            evaluate(d(9), &third_period(), &[], &engagements, &[]),
            Some(Unavailability::TeachingElsewhere {
                attendance_record_id: 77,
                schedule_slot_id: 20
            })
        );
    }

    #[test]
    fn pending_or_absent_engagements_do_not_block() {
        for status in [AttendanceStatus::Pending, AttendanceStatus::TidakHadir] {
            let engagements = [Engagement {
                attendance_record_id: 77,
                status,
                window: window(20, 3, t(8, 30), t(9, 15)),
            }];
            assert_eq!(evaluate(d(9), &third_period(), &[], &engagements, &[]), None);
        }
    }

    #[test]
    fn adjacent_period_does_not_block() {
        let engagements = [Engagement {
            attendance_record_id: 78,
            status: AttendanceStatus::Telat,
            window: window(21, 4, t(9, 15), t(10, 0)),
        }];
        assert_eq!(evaluate(d(9), &third_period(), &[], &engagements, &[]), None);
    }

    #[test]
    fn record_on_the_target_slot_itself_is_ignored() {
        let engagements = [Engagement {
            attendance_record_id: 79,
            status: AttendanceStatus::Hadir,
            window: third_period(),
        }];
        assert_eq!(evaluate(d(9), &third_period(), &[], &engagements, &[]), None);
    }

    #[test]
    fn booked_substitution_in_overlapping_period_blocks() {
        let engagements = [Engagement {
            attendance_record_id: 80,
            status: AttendanceStatus::Diganti,
            window: window(22, 3, t(8, 30), t(9, 15)),
        }];
        assert_eq!(
            evaluate(d(9), &third_period(), &[], &engagements, &[]),
            Some(Unavailability::SubstitutingElsewhere {
                attendance_record_id: 80,
                schedule_slot_id: 22
            })
        );
    }

    #[test]
    fn own_slot_in_overlapping_period_blocks_before_any_record() {
        let scheduled = [ScheduledPeriod {
            window: window(30, 3, t(8, 30), t(9, 15)),
            handed_over: false,
        }];
        assert_eq!(
            evaluate(d(9), &third_period(), &[], &[], &scheduled),
            Some(Unavailability::ScheduledToTeach {
                schedule_slot_id: 30
            })
        );
    }

    #[test]
    fn own_slot_already_handed_over_does_not_block() {
        let scheduled = [
            ScheduledPeriod {
                window: window(30, 3, t(8, 30), t(9, 15)),
                handed_over: true,
            },
            ScheduledPeriod {
                window: window(31, 4, t(9, 15), t(10, 0)),
                handed_over: false,
            },
        ];
        assert_eq!(evaluate(d(9), &third_period(), &[], &[], &scheduled), None);
    }

    #[test]
    fn leave_is_reported_ahead_of_own_slot() {
        let leaves = [LeaveWindow {
            leave_id: 5,
            start_date: d(9),
            end_date: d(9),
        }];
        let scheduled = [ScheduledPeriod {
            window: window(30, 3, t(8, 30), t(9, 15)),
            handed_over: false,
        }];
        assert_eq!(
            evaluate(d(9), &third_period(), &leaves, &[], &scheduled),
            Some(Unavailability::OnLeave { leave_id: 5 })
        );
    }

    #[test]
    fn reasons_render_for_messages() {
        assert_eq!(
            Unavailability::OnLeave { leave_id: 4 }.to_string(),
            "on approved leave #4"
        );
        assert_eq!(
            Unavailability::ScheduledToTeach {
                schedule_slot_id: 30
            }
            .to_string(),
            "scheduled to teach schedule slot 30"
        );
    }

    #[test]
    fn same_ordinal_overlaps_even_with_odd_times() {
        let a = window(1, 2, t(7, 45), t(8, 30));
        let b = window(2, 2, t(10, 0), t(10, 45));
        assert!(a.overlaps(&b));
    }
}
