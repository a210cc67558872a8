//! Fixture builders shared by the repository tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use presensi_core::calendar::DayOfWeek;
use presensi_db::models::schedule_slot::{CreateScheduleSlot, ScheduleSlot};
use presensi_db::models::user::{CreateUser, User};
use presensi_db::repositories::{LookupRepo, ScheduleSlotRepo, UserRepo};
use sqlx::PgPool;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
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
