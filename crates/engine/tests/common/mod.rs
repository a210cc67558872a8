//! Fixtures shared by the engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use presensi_core::calendar::DayOfWeek;
use presensi_core::leave::{LeaveDraft, LeaveReason};
use presensi_db::models::schedule_slot::{CreateScheduleSlot, ScheduleSlot};
use presensi_db::models::user::{CreateUser, User};
use presensi_db::repositories::{LookupRepo, ScheduleSlotRepo, UserRepo};
use presensi_engine::{AttendanceEngine, EngineConfig, LeaveWorkflow, RosterCache, SubstituteMatcher};
use presensi_events::EventBus;
use sqlx::PgPool;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// 2026-03-09, a Monday.
pub fn monday() -> NaiveDate {
    d(2026, 3, 9)
}

pub fn tuesday() -> NaiveDate {
    d(2026, 3, 10)
}

pub fn wednesday() -> NaiveDate {
    d(2026, 3, 11)
}

pub struct Engines {
    pub attendance: AttendanceEngine,
    pub leaves: LeaveWorkflow,
    pub matcher: SubstituteMatcher,
    pub events: Arc<EventBus>,
    pub roster: Arc<RosterCache>,
}

pub fn engines(pool: &PgPool) -> Engines {
    let events = Arc::new(EventBus::default());
    let roster = Arc::new(RosterCache::new());
    Engines {
        attendance: AttendanceEngine::new(pool.clone(), Arc::clone(&events), EngineConfig::default()),
        leaves: LeaveWorkflow::new(pool.clone(), Arc::clone(&events)),
        matcher: SubstituteMatcher::new(pool.clone(), Arc::clone(&roster)),
        events,
        roster,
    }
}

pub async fn user(pool: &PgPool, name: &str, role: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            name: name.to_string(),
            nip: None,
            email: Some(format!("{}@sekolah.test", name.to_lowercase().replace(' ', "."))),
            role: role.to_string(),
        },
    )
    .await
    .unwrap()
}

/// A class and a subject to hang slots on.
pub async fn class_and_subject(pool: &PgPool, class: &str, subject: &str) -> (i64, i64) {
    let class = LookupRepo::create_class_section(pool, class, Some(10)).await.unwrap();
    let subject = LookupRepo::create_subject(pool, subject, None).await.unwrap();
    (class.id, subject.id)
}

pub async fn slot(
    pool: &PgPool,
    teacher_id: i64,
    class_section_id: i64,
    subject_id: i64,
    day: DayOfWeek,
    period: i32,
    start: NaiveTime,
    end: NaiveTime,
) -> ScheduleSlot {
    ScheduleSlotRepo::create(
        pool,
        &CreateScheduleSlot {
            teacher_id,
            day_of_week: day,
            period,
            subject_id,
            class_section_id,
            start_time: start,
            end_time: end,
            room: None,
        },
    )
    .await
    .unwrap()
}

/// A sick-leave draft for `teacher_id` over `[start, end]`.
pub fn sick_leave(
    teacher_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    substitute_teacher_id: Option<i64>,
) -> LeaveDraft {
    LeaveDraft {
        teacher_id,
        reason: LeaveReason::Sick,
        custom_reason: None,
        start_date: start,
        end_date: end,
        substitute_teacher_id,
    }
}

pub async fn count_records(pool: &PgPool) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attendance_records")
        .fetch_one(pool)
        .await
        .unwrap();
    count
}
