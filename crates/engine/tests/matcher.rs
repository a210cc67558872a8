//! Substitute candidate search and the roster cache.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{class_and_subject, engines, monday, sick_leave, slot, t, tuesday, user};
use presensi_core::attendance::ConfirmStatus;
use presensi_core::calendar::DayOfWeek;
use presensi_core::error::CoreError;
use presensi_db::repositories::UserRepo;
use presensi_engine::roster::listen_for_roster_changes;
use presensi_engine::{EngineError, RosterCache};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_teacher_on_leave_is_not_a_candidate(pool: PgPool) {
    let e = engines(&pool);
    let teacher = user(&pool, "Budi", "guru").await;
    let away = user(&pool, "Andi", "guru").await;
    let free = user(&pool, "Siti", "guru").await;
    let staff = user(&pool, "Wati", "kurikulum").await;
    let (class_id, subject_id) = class_and_subject(&pool, "X IPA 1", "Fisika").await;
    let s = slot(&pool, teacher.id, class_id, subject_id, DayOfWeek::Monday, 3, t(8, 30), t(9, 15)).await;

    // Andi has no attendance record on Monday, only an approved leave.
    let leave = e
        .leaves
        .submit(sick_leave(away.id, monday(), monday(), None), away.id)
        .await
        .unwrap();
    e.leaves.approve(leave.id, staff.id).await.unwrap();

    let candidates = e.matcher.find_candidates(s.id, monday(), None).await.unwrap();
    let ids: Vec<_> = candidates.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![free.id, staff.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_candidates_are_filtered_and_ordered(pool: PgPool) {
    let e = engines(&pool);
    let teacher = user(&pool, "Budi", "guru").await;
    let zaki = user(&pool, "Zaki", "guru").await;
    let ani = user(&pool, "ani", "kepala_sekolah").await;
    let excluded = user(&pool, "Citra", "guru").await;
    let retired = user(&pool, "Dedi", "guru").await;
    user(&pool, "Rina", "siswa").await;
    UserRepo::set_active(&pool, retired.id, false).await.unwrap();

    let (class_id, subject_id) = class_and_subject(&pool, "X IPA 1", "Fisika").await;
    let s = slot(&pool, teacher.id, class_id, subject_id, DayOfWeek::Monday, 1, t(7, 0), t(7, 45)).await;

    let candidates = e
        .matcher
        .find_candidates(s.id, monday(), Some(excluded.id))
        .await
        .unwrap();
    let ids: Vec<_> = candidates.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![ani.id, zaki.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_teacher_confirmed_in_overlapping_period_is_busy(pool: PgPool) {
    let e = engines(&pool);
    let teacher = user(&pool, "Budi", "guru").await;
    let busy = user(&pool, "Siti", "guru").await;
    let later = user(&pool, "Tono", "guru").await;
    let (class_a, subject_a) = class_and_subject(&pool, "X IPA 1", "Fisika").await;
    let (class_b, subject_b) = class_and_subject(&pool, "X IPA 2", "Kimia").await;
    let s = slot(&pool, teacher.id, class_a, subject_a, DayOfWeek::Monday, 1, t(7, 0), t(7, 45)).await;
    let overlapping = slot(&pool, busy.id, class_b, subject_b, DayOfWeek::Monday, 1, t(7, 0), t(7, 45)).await;
    let adjacent = slot(&pool, later.id, class_b, subject_b, DayOfWeek::Monday, 2, t(7, 45), t(8, 30)).await;

    for (slot_id, teacher_id) in [(overlapping.id, busy.id), (adjacent.id, later.id)] {
        let record = e
            .attendance
            .report_arrival(slot_id, monday(), None, None, teacher_id)
            .await
            .unwrap();
        e.attendance.confirm(record.id, ConfirmStatus::Hadir, None, None).await.unwrap();
    }

    let candidates = e.matcher.find_candidates(s.id, monday(), None).await.unwrap();
    let ids: Vec<_> = candidates.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![later.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_teacher_due_in_own_class_is_not_a_candidate(pool: PgPool) {
    let e = engines(&pool);
    let teacher = user(&pool, "Budi", "guru").await;
    let busy = user(&pool, "Siti", "guru").await;
    let free = user(&pool, "Tono", "guru").await;
    let staff = user(&pool, "Wati", "kurikulum").await;
    let (class_a, subject_a) = class_and_subject(&pool, "X IPA 1", "Fisika").await;
    let (class_b, subject_b) = class_and_subject(&pool, "X IPA 2", "Kimia").await;
    let s = slot(&pool, teacher.id, class_a, subject_a, DayOfWeek::Monday, 3, t(8, 30), t(9, 15)).await;
    let own = slot(&pool, busy.id, class_b, subject_b, DayOfWeek::Monday, 3, t(8, 30), t(9, 15)).await;

    // No record exists yet for Siti's own class; her timetable alone blocks her.
    let candidates = e.matcher.find_candidates(s.id, monday(), Some(staff.id)).await.unwrap();
    let ids: Vec<_> = candidates.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![free.id]);

    // Once Tono covers Siti's class, she is free and he is booked.
    let absent = e.attendance.mark_absent(own.id, monday(), staff.id).await.unwrap();
    e.attendance
        .assign_substitute(absent.id, free.id, None, staff.id)
        .await
        .unwrap();

    let candidates = e.matcher.find_candidates(s.id, monday(), Some(staff.id)).await.unwrap();
    let ids: Vec<_> = candidates.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![busy.id]);

    // Siti's slot only meets on Mondays.
    let tuesday_slot = slot(&pool, teacher.id, class_a, subject_a, DayOfWeek::Tuesday, 3, t(8, 30), t(9, 15)).await;
    let candidates = e.matcher.find_candidates(tuesday_slot.id, tuesday(), Some(staff.id)).await.unwrap();
    let ids: Vec<_> = candidates.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![busy.id, free.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_candidates_validates_slot_and_date(pool: PgPool) {
    let e = engines(&pool);
    let teacher = user(&pool, "Budi", "guru").await;
    let (class_id, subject_id) = class_and_subject(&pool, "X IPA 1", "Fisika").await;
    let s = slot(&pool, teacher.id, class_id, subject_id, DayOfWeek::Monday, 1, t(7, 0), t(7, 45)).await;

    assert_matches!(
        e.matcher.find_candidates(s.id, tuesday(), None).await,
        Err(EngineError::Core(CoreError::Validation(_)))
    );
    assert_matches!(
        e.matcher.find_candidates(9_999, monday(), None).await,
        Err(EngineError::Core(CoreError::NotFound { entity: "ScheduleSlot", .. }))
    );
    assert!(e.matcher.find_candidates(s.id, monday(), None).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Roster cache
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cache_serves_stale_roster_until_invalidated(pool: PgPool) {
    let e = engines(&pool);
    let teacher = user(&pool, "Budi", "guru").await;
    let (class_id, subject_id) = class_and_subject(&pool, "X IPA 1", "Fisika").await;
    let s = slot(&pool, teacher.id, class_id, subject_id, DayOfWeek::Monday, 1, t(7, 0), t(7, 45)).await;

    assert!(e.matcher.find_candidates(s.id, monday(), None).await.unwrap().is_empty());
    let newcomer = user(&pool, "Siti", "guru").await;
    assert!(e.matcher.find_candidates(s.id, monday(), None).await.unwrap().is_empty());

    e.roster.invalidate().await;
    let candidates = e.matcher.find_candidates(s.id, monday(), None).await.unwrap();
    assert_eq!(candidates[0].id, newcomer.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_roster_writes_invalidate_the_cache(pool: PgPool) {
    let cache = Arc::new(RosterCache::new());
    let cancel = CancellationToken::new();
    let listener = tokio::spawn(listen_for_roster_changes(
        pool.clone(),
        Arc::clone(&cache),
        cancel.clone(),
    ));
    tokio::time::sleep(Duration::from_millis(300)).await;

    cache.get_or_load(&pool).await.unwrap();
    assert!(cache.is_loaded().await);

    user(&pool, "Siti", "guru").await;

    let mut invalidated = false;
    for _ in 0..50 {
        if !cache.is_loaded().await {
            invalidated = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(invalidated, "roster cache should be invalidated by the users trigger");

    cancel.cancel();
    listener.await.unwrap();
}
