//! Integration tests for roster queries on the `users` table.

mod common;

use common::{d, user};
use presensi_core::leave::LeaveReason;
use presensi_db::models::leave::LeaveRequestInput;
use presensi_db::repositories::{LeaveRepo, UserRepo};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_eligible_substitutes_exclude_students_and_inactive(pool: PgPool) {
    let budi = user(&pool, "budi", "guru").await;
    let ani = user(&pool, "Ani", "kepala_sekolah").await;
    user(&pool, "Rina", "siswa").await;
    let retired = user(&pool, "Cahyo", "guru").await;
    UserRepo::set_active(&pool, retired.id, false).await.unwrap();

    let roster = UserRepo::list_eligible_substitutes(&pool).await.unwrap();
    let ids: Vec<i64> = roster.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![ani.id, budi.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_free_for_range_skips_teachers_on_leave(pool: PgPool) {
    let requester = user(&pool, "Budi", "guru").await;
    let away = user(&pool, "Sari", "guru").await;
    let free = user(&pool, "Tono", "guru").await;
    let staff = user(&pool, "Kurikulum", "kurikulum").await;

    let leave = LeaveRepo::create(
        &pool,
        &LeaveRequestInput {
            teacher_id: away.id,
            reason: LeaveReason::Family,
            custom_reason: None,
            start_date: d(2026, 3, 10),
            end_date: d(2026, 3, 12),
            substitute_teacher_id: None,
        },
        away.id,
    )
    .await
    .unwrap();
    LeaveRepo::approve(&pool, leave.id, staff.id).await.unwrap().unwrap();

    let candidates = UserRepo::list_free_for_range(&pool, requester.id, d(2026, 3, 9), d(2026, 3, 10))
        .await
        .unwrap();
    let ids: Vec<i64> = candidates.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![staff.id, free.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_lock_for_update_reports_missing_user(pool: PgPool) {
    let budi = user(&pool, "Budi", "guru").await;
    let mut tx = pool.begin().await.unwrap();
    assert!(UserRepo::lock_for_update(&mut *tx, budi.id).await.unwrap());
    assert!(!UserRepo::lock_for_update(&mut *tx, budi.id + 1000).await.unwrap());
    tx.commit().await.unwrap();
}
