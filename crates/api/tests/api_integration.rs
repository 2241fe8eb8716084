//! API integration tests.
//!
//! These tests drive the full router over mock database connections and an
//! in-memory role store, so they cover routing, the auth middleware, the
//! permission gate and response shapes without needing Postgres or Redis.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use classreg_api::{endpoints, middleware::AppState};
use classreg_common::{MemoryRoleStore, RoleCache};
use classreg_core::{NotificationService, UserService};
use classreg_db::{
    entities::user::{self, UserStatus, UserType},
    repositories::{LinkRepository, NotificationRepository, UserRepository},
};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use std::sync::Arc;
use tower::ServiceExt;

fn test_user(id: &str, email: &str, user_type: UserType, status: UserStatus) -> user::Model {
    user::Model {
        id: id.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        email: email.to_string(),
        password_hash: None,
        token: Some("test-token".to_string()),
        user_type,
        status,
        is_deleted: false,
        last_login: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

/// Build a router over the given mock connections and role store.
fn test_router(user_db: MockDatabase, link_db: MockDatabase, roles: MemoryRoleStore) -> Router {
    let user_repo = UserRepository::new(Arc::new(user_db.into_connection()));
    let link_repo = LinkRepository::new(Arc::new(link_db.into_connection()));
    let notification_repo = NotificationRepository::new(Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
    ));

    let role_cache: RoleCache = Arc::new(roles);

    let state = AppState {
        user_service: UserService::new(user_repo.clone(), link_repo.clone()),
        notification_service: NotificationService::new(user_repo, link_repo, notification_repo),
        role_cache,
    };

    endpoints::router(state)
}

fn empty_router() -> Router {
    test_router(
        MockDatabase::new(DatabaseBackend::Postgres),
        MockDatabase::new(DatabaseBackend::Postgres),
        MemoryRoleStore::new(),
    )
}

#[tokio::test]
async fn health_is_open() {
    let response = empty_router()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn profile_requires_auth() {
    let response = empty_router()
        .oneshot(
            Request::builder()
                .uri("/users/profile")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn teacher_register_requires_auth() {
    let response = empty_router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/teachers/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"teacher":"t@x.com","students":["s@x.com"]}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn anonymous_suspend_is_rejected() {
    // No Authorization header: the gate must refuse before any lookup or
    // write can happen. The mock connection holds no results, so a query
    // slipping through would surface as a 500, not a 401.
    let response = empty_router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/students/suspend")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"email":"victim@x.com"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn suspend_without_permission_code_is_forbidden() {
    // Authenticated caller whose role-cache entry is missing: miss means
    // empty, and empty denies.
    let user_db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
        test_user("t0", "admin@x.com", UserType::Teacher, UserStatus::Active),
    ]]);

    let response = test_router(
        user_db,
        MockDatabase::new(DatabaseBackend::Postgres),
        MemoryRoleStore::new(),
    )
    .oneshot(
        Request::builder()
            .method("POST")
            .uri("/students/suspend")
            .header(header::AUTHORIZATION, "Bearer test-token")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email":"victim@x.com"}"#))
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unrelated_permission_code_does_not_open_the_route() {
    let user_db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
        test_user("t0", "admin@x.com", UserType::Teacher, UserStatus::Active),
    ]]);
    let roles = MemoryRoleStore::new().with_roles("t0", &["GET_COMMON_STUDENTS"]);

    let response = test_router(user_db, MockDatabase::new(DatabaseBackend::Postgres), roles)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/students/suspend")
                .header(header::AUTHORIZATION, "Bearer test-token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"email":"victim@x.com"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_routes_reject_anonymous_callers() {
    let response = empty_router()
        .oneshot(
            Request::builder()
                .uri("/admin/users")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn common_students_without_teachers_is_rejected() {
    let user_db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
        test_user("t0", "admin@x.com", UserType::Teacher, UserStatus::Active),
    ]]);
    let roles = MemoryRoleStore::new().with_roles("t0", &["GET_COMMON_STUDENTS"]);

    let response = test_router(user_db, MockDatabase::new(DatabaseBackend::Postgres), roles)
        .oneshot(
            Request::builder()
                .uri("/students/common")
                .header(header::AUTHORIZATION, "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn common_students_returns_intersection() {
    use maplit::btreemap;
    use sea_orm::Value;

    let user_db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[test_user(
            "t0",
            "admin@x.com",
            UserType::Teacher,
            UserStatus::Active,
        )]])
        .append_query_results([vec![
            test_user("t1", "t1@x.com", UserType::Teacher, UserStatus::Active),
            test_user("t2", "t2@x.com", UserType::Teacher, UserStatus::Active),
        ]]);
    let link_db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![
        btreemap! { "email" => Value::from("both@x.com") },
    ]]);
    let roles = MemoryRoleStore::new().with_roles("t0", &["GET_COMMON_STUDENTS"]);

    let response = test_router(user_db, link_db, roles)
        .oneshot(
            Request::builder()
                .uri("/students/common?teachers=t1@x.com&teachers=t2@x.com")
                .header(header::AUTHORIZATION, "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["students"], serde_json::json!(["both@x.com"]));
}

#[tokio::test]
async fn suspend_returns_no_content() {
    let user_db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[test_user(
            "t0",
            "admin@x.com",
            UserType::Teacher,
            UserStatus::Active,
        )]])
        .append_query_results([[test_user(
            "s1",
            "s1@x.com",
            UserType::Student,
            UserStatus::Active,
        )]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }]);
    let roles = MemoryRoleStore::new().with_roles("t0", &["SUSPEND_STUDENT"]);

    let response = test_router(user_db, MockDatabase::new(DatabaseBackend::Postgres), roles)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/students/suspend")
                .header(header::AUTHORIZATION, "Bearer test-token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"email":"s1@x.com"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn suspend_twice_reports_already_suspended() {
    let mut suspended = test_user("s1", "s1@x.com", UserType::Student, UserStatus::Suspended);
    suspended.is_deleted = true;
    let user_db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[test_user(
            "t0",
            "admin@x.com",
            UserType::Teacher,
            UserStatus::Active,
        )]])
        .append_query_results([[suspended]]);
    let roles = MemoryRoleStore::new().with_roles("t0", &["SUSPEND_STUDENT"]);

    let response = test_router(user_db, MockDatabase::new(DatabaseBackend::Postgres), roles)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/students/suspend")
                .header(header::AUTHORIZATION, "Bearer test-token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"email":"s1@x.com"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn teacher_register_full_flow_returns_no_content() {
    // Token resolution, the gate, teacher + student guard lookups, then the
    // link write.
    let user_db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([
        vec![test_user(
            "t0",
            "admin@x.com",
            UserType::Teacher,
            UserStatus::Active,
        )],
        vec![test_user(
            "t1",
            "t@x.com",
            UserType::Teacher,
            UserStatus::Active,
        )],
        vec![test_user(
            "s1",
            "s1@x.com",
            UserType::Student,
            UserStatus::Active,
        )],
    ]);
    let link_db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<classreg_db::entities::teacher_student_link::Model>::new()])
        .append_query_results([[classreg_db::entities::teacher_student_link::Model {
            id: "l1".to_string(),
            student_id: "s1".to_string(),
            teacher_id: "t1".to_string(),
            is_deleted: false,
            created_by: "admin@x.com".to_string(),
            updated_by: "admin@x.com".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }]]);
    let roles = MemoryRoleStore::new().with_roles("t0", &["REGISTER_STUDENT_TO_TEACHER"]);

    let response = test_router(user_db, link_db, roles)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/teachers/register")
                .header(header::AUTHORIZATION, "Bearer test-token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"teacher":"t@x.com","students":["s1@x.com"]}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn notification_recipients_reject_student_sender() {
    // The sender holds the permission code but is not a teacher; the
    // service-level check still refuses.
    let user_db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
        test_user("s9", "s9@x.com", UserType::Student, UserStatus::Active),
    ]]);
    let roles = MemoryRoleStore::new().with_roles("s9", &["GET_NOTIFICATION_RECIPIENTS"]);

    let response = test_router(user_db, MockDatabase::new(DatabaseBackend::Postgres), roles)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/notifications/recipients")
                .header(header::AUTHORIZATION, "Bearer test-token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"teacher":"t@x.com","notification":"hello"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn notification_recipients_require_permission_code() {
    let user_db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
        test_user("t1", "t1@x.com", UserType::Teacher, UserStatus::Active),
    ]]);

    let response = test_router(
        user_db,
        MockDatabase::new(DatabaseBackend::Postgres),
        MemoryRoleStore::new(),
    )
    .oneshot(
        Request::builder()
            .method("POST")
            .uri("/notifications/recipients")
            .header(header::AUTHORIZATION, "Bearer test-token")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"teacher":"t@x.com","notification":"hello"}"#,
            ))
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_endpoint_returns_404() {
    let response = empty_router()
        .oneshot(
            Request::builder()
                .uri("/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
