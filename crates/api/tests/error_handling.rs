//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly and need no database.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use presensi_api::error::AppError;
use presensi_core::error::CoreError;
use presensi_engine::EngineError;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "AttendanceRecord",
        id: 42,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "AttendanceRecord with id 42 not found");
}

#[tokio::test]
async fn domain_rule_violations_return_422() {
    for err in [
        CoreError::Validation("end_date is before start_date".into()),
        CoreError::DurationExceeded { days: 31, max: 30 },
        CoreError::InvalidSubstitute("Siti is on leave".into()),
    ] {
        let code = err.code();
        let (status, json) = error_to_response(AppError::Core(err)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["code"], code);
    }
}

#[tokio::test]
async fn state_conflicts_return_409() {
    let err = AppError::Core(CoreError::AlreadyProcessed {
        entity: "LeaveRequest",
        id: 7,
        status: "approved".into(),
    });
    let (status, json) = error_to_response(err).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "ALREADY_PROCESSED");
    assert_eq!(
        json["error"],
        "LeaveRequest 7 has already been processed (status: approved)"
    );

    let err = AppError::Core(CoreError::ScheduleConflict(
        "Schedule slot 3 on 2026-03-10 is already recorded as hadir".into(),
    ));
    let (status, json) = error_to_response(err).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "SCHEDULE_CONFLICT");

    let err = AppError::Core(CoreError::InvalidTransition {
        entity: "AttendanceRecord",
        id: 1,
        from: "hadir".into(),
        to: "telat".into(),
    });
    let (status, _) = error_to_response(err).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn persistence_failures_are_sanitized() {
    let err = AppError::from(EngineError::Persistence(sqlx::Error::PoolTimedOut));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "PERSISTENCE_FAILURE");
    assert_eq!(json["error"], "A database error occurred");
}

#[tokio::test]
async fn internal_core_error_is_sanitized() {
    let err = AppError::Core(CoreError::Internal("smtp password rejected".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("invalid field value".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}
