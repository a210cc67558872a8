//! Shared harness for the HTTP integration tests.
//!
//! Builds the production router over a `sqlx::test` pool and signs tokens
//! with a fixed test secret.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::NaiveTime;
use http_body_util::BodyExt;
use presensi_api::auth::jwt::{generate_access_token, JwtConfig};
use presensi_api::config::ServerConfig;
use presensi_api::state::AppState;
use presensi_core::calendar::DayOfWeek;
use presensi_db::models::schedule_slot::{CreateScheduleSlot, ScheduleSlot};
use presensi_db::models::user::{CreateUser, User};
use presensi_db::repositories::{LookupRepo, ScheduleSlotRepo, UserRepo};
use presensi_engine::{EngineConfig, RosterCache};
use presensi_events::EventBus;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
        access_token_expiry_mins: 15,
    }
}

/// A `ServerConfig` with safe defaults and the test JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: test_jwt_config(),
        engine: EngineConfig::default(),
    }
}

/// Build the full application router, middleware included.
pub fn build_test_app(pool: PgPool) -> Router {
    let state = AppState::new(
        pool,
        Arc::new(test_config()),
        Arc::new(EventBus::default()),
        Arc::new(RosterCache::new()),
    );
    presensi_api::build_app(state)
}

pub fn bearer(user: &User) -> String {
    let token = generate_access_token(user.id, &user.role, &test_jwt_config()).unwrap();
    format!("Bearer {token}")
}

/// Send a request and return the status with the parsed JSON body
/// (`Value::Null` for an empty body).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str, auth: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, Some(auth), None).await
}

pub async fn post(app: &Router, uri: &str, auth: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(auth), Some(body)).await
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
            email: Some(format!("{}@sekolah.test", name.to_lowercase())),
            role: role.to_string(),
        },
    )
    .await
    .unwrap()
}

/// A slot for `teacher_id` in a fresh class and subject.
pub async fn slot(
    pool: &PgPool,
    teacher_id: i64,
    class: &str,
    day: DayOfWeek,
    period: i32,
    start: NaiveTime,
    end: NaiveTime,
) -> ScheduleSlot {
    let class = LookupRepo::create_class_section(pool, class, Some(10)).await.unwrap();
    let subject = LookupRepo::create_subject(pool, &format!("Mapel {}", class.name), None)
        .await
        .unwrap();
    ScheduleSlotRepo::create(
        pool,
        &CreateScheduleSlot {
            teacher_id,
            day_of_week: day,
            period,
            subject_id: subject.id,
            class_section_id: class.id,
            start_time: start,
            end_time: end,
            room: None,
        },
    )
    .await
    .unwrap()
}
