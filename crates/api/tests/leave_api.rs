//! Leave request endpoints, end to end through the router.

mod common;

use axum::http::{Method, StatusCode};
use common::{bearer, build_test_app, get, post, send, slot, t, user};
use presensi_core::calendar::DayOfWeek;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_submit_approve_and_reapprove(pool: PgPool) {
    let teacher = user(&pool, "Budi", "guru").await;
    let substitute = user(&pool, "Siti", "guru").await;
    let staff = user(&pool, "Wati", "kurikulum").await;
    slot(&pool, teacher.id, "X IPA 1", DayOfWeek::Monday, 3, t(8, 30), t(9, 15)).await;
    let app = build_test_app(pool);

    let (status, json) = post(
        &app,
        "/api/v1/leaves",
        &bearer(&teacher),
        json!({
            "reason": "sick",
            "start_date": "2026-03-09",
            "end_date": "2026-03-11",
            "substitute_teacher_id": substitute.id,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["teacher_id"], teacher.id);
    let leave_id = json["data"]["id"].as_i64().unwrap();

    let uri = format!("/api/v1/leaves/{leave_id}/approve");
    let (status, json) = post(&app, &uri, &bearer(&staff), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["leave"]["status"], "approved");
    assert_eq!(json["data"]["substituted"], 1);

    let (status, json) = post(&app, &uri, &bearer(&staff), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "ALREADY_PROCESSED");

    // The covered Monday period shows up in history as diganti.
    let (status, json) = get(
        &app,
        "/api/v1/attendance/history?status=diganti",
        &bearer(&staff),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["records"][0]["acting_teacher_id"], substitute.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_validation_failures_are_unprocessable(pool: PgPool) {
    let teacher = user(&pool, "Budi", "guru").await;
    let app = build_test_app(pool);
    let auth = bearer(&teacher);

    let (status, json) = post(
        &app,
        "/api/v1/leaves",
        &auth,
        json!({ "reason": "annual", "start_date": "2026-03-01", "end_date": "2026-03-31" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "DURATION_EXCEEDED");

    let (status, json) = post(
        &app,
        "/api/v1/leaves",
        &auth,
        json!({ "reason": "other", "start_date": "2026-03-09", "end_date": "2026-03-09" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let (status, json) = post(
        &app,
        "/api/v1/leaves",
        &auth,
        json!({
            "reason": "sick",
            "start_date": "2026-03-09",
            "end_date": "2026-03-09",
            "substitute_teacher_id": teacher.id,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "INVALID_SUBSTITUTE");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_leave_is_not_found(pool: PgPool) {
    let staff = user(&pool, "Wati", "kurikulum").await;
    let app = build_test_app(pool);

    let (status, json) = get(&app, "/api/v1/leaves/999999", &bearer(&staff)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "LeaveRequest with id 999999 not found");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reject_then_withdraw_is_refused(pool: PgPool) {
    let teacher = user(&pool, "Budi", "guru").await;
    let staff = user(&pool, "Wati", "kurikulum").await;
    let app = build_test_app(pool);

    let (_, json) = post(
        &app,
        "/api/v1/leaves",
        &bearer(&teacher),
        json!({ "reason": "family", "start_date": "2026-03-09", "end_date": "2026-03-10" }),
    )
    .await;
    let leave_id = json["data"]["id"].as_i64().unwrap();

    let (status, json) = post(
        &app,
        &format!("/api/v1/leaves/{leave_id}/reject"),
        &bearer(&staff),
        json!({ "rejection_reason": "" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let (status, json) = post(
        &app,
        &format!("/api/v1/leaves/{leave_id}/reject"),
        &bearer(&staff),
        json!({ "rejection_reason": "Jadwal ujian" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "rejected");
    assert_eq!(json["data"]["rejection_reason"], "Jadwal ujian");

    let (status, json) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/leaves/{leave_id}"),
        Some(&bearer(&teacher)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "ALREADY_PROCESSED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_teachers_only_list_their_own_leaves(pool: PgPool) {
    let budi = user(&pool, "Budi", "guru").await;
    let siti = user(&pool, "Siti", "guru").await;
    let staff = user(&pool, "Wati", "kurikulum").await;
    let app = build_test_app(pool);

    for teacher in [&budi, &siti] {
        let (status, _) = post(
            &app,
            "/api/v1/leaves",
            &bearer(teacher),
            json!({ "reason": "official", "start_date": "2026-03-09", "end_date": "2026-03-09" }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, json) = get(&app, "/api/v1/leaves", &bearer(&budi)).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["leaves"][0]["teacher_name"], "Budi");

    let (_, json) = get(&app, "/api/v1/leaves?status=pending", &bearer(&staff)).await;
    assert_eq!(json["data"]["total"], 2);
    assert_eq!(json["data"]["counts"]["pending"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_inverted_list_range_is_bad_request(pool: PgPool) {
    let staff = user(&pool, "Wati", "kurikulum").await;
    let app = build_test_app(pool);

    let (status, json) = get(
        &app,
        "/api/v1/leaves?from=2026-03-10&to=2026-03-01",
        &bearer(&staff),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}
