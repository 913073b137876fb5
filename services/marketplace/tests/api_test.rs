use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use hyperskill_auth::JwtService;
use hyperskill_common::{
    ApiResponse, DatabaseConfig, JwtConfig, Role, ServerConfig, VerificationStatus,
};
use hyperskill_database::{
    seed_admin, CreateOutcome, LearningCategory, LearningField, MemoryStore, Store, TeacherRecord,
    TeacherRepository, VerificationStats,
};
use hyperskill_marketplace::{
    config::{AdminSeedConfig, AppConfig},
    models::{AuthResponse, SessionRequestResponse, TeacherPageResponse, TeacherResponse},
    routes,
    services::AppState,
};

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec![],
        },
        database: DatabaseConfig {
            host: "localhost".to_string(),
            port: 5432,
            username: "unused".to_string(),
            password: "unused".to_string(),
            database: "unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            expiration_hours: 1,
            issuer: "hyperskill-test".to_string(),
        },
        admin: AdminSeedConfig {
            email: "admin@hyperskill.com".to_string(),
            password: "admin123".to_string(),
        },
    }
}

async fn test_server() -> (TestServer, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    seed_admin(store.as_ref(), "admin@hyperskill.com", "admin123")
        .await
        .unwrap();

    let config = test_config();
    let state = AppState {
        store: store.clone() as Arc<dyn Store>,
        jwt_service: JwtService::new(&config.jwt.secret),
        config,
    };

    let server = TestServer::new(routes::create_router(state)).unwrap();
    (server, store)
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

async fn register(server: &TestServer, email: &str, password: &str, role: Option<&str>) {
    let response = server
        .post("/register")
        .json(&json!({ "email": email, "password": password, "role": role }))
        .await;
    response.assert_status_ok();
}

async fn login(server: &TestServer, email: &str, password: &str) -> AuthResponse {
    let response = server
        .post("/login")
        .json(&json!({ "email": email, "password": password }))
        .await;
    response.assert_status_ok();
    response.json::<ApiResponse<AuthResponse>>().data.unwrap()
}

async fn admin_token(server: &TestServer) -> String {
    let response = server
        .post("/admin-login")
        .json(&json!({ "email": "admin@hyperskill.com", "password": "admin123" }))
        .await;
    response.assert_status_ok();
    response
        .json::<ApiResponse<AuthResponse>>()
        .data
        .unwrap()
        .token
}

fn seeded_teacher(n: usize, status: VerificationStatus, field: &str) -> TeacherRecord {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    TeacherRecord {
        account_id: Uuid::new_v4(),
        name: format!("Teacher {:02}", n),
        email: format!("teacher{:02}@example.com", n),
        age: Some(30),
        qualification: format!("Qualification {:02}", n),
        work_experience: None,
        teaching_field: field.to_string(),
        subjects: vec![field.to_string()],
        languages: vec!["English".to_string()],
        hourly_rate: None,
        certificate_link: None,
        availability: serde_json::json!([]),
        verification_status: status.as_str().to_string(),
        created_at: base + Duration::minutes(n as i64),
    }
}

async fn seed_teachers(store: &MemoryStore, records: Vec<TeacherRecord>) {
    for record in records {
        match store.teachers().create_if_absent(record).await.unwrap() {
            CreateOutcome::Created(_) => {}
            CreateOutcome::AlreadyExists => panic!("unexpected duplicate in test setup"),
        }
    }
}

#[tokio::test]
async fn liveness_and_health() {
    let (server, _store) = test_server().await;

    let response = server.get("/").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "HyperSkill backend running");

    let health = server.get("/health").await;
    health.assert_status_ok();
    assert!(health.json::<ApiResponse<String>>().success);
}

#[tokio::test]
async fn register_then_login_detects_role() {
    let (server, _store) = test_server().await;

    register(&server, "a@x.com", "pw1", Some("teacher")).await;

    let auth = login(&server, "a@x.com", "pw1").await;
    assert_eq!(auth.role, Some(Role::Teacher));
    assert_eq!(auth.user.email, "a@x.com");
    assert!(!auth.token.is_empty());

    let wrong = server
        .post("/login")
        .json(&json!({ "email": "a@x.com", "password": "pw2" }))
        .await;
    wrong.assert_status(StatusCode::UNAUTHORIZED);

    let unknown = server
        .post("/login")
        .json(&json!({ "email": "nobody@x.com", "password": "pw1" }))
        .await;
    unknown.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let (server, _store) = test_server().await;

    register(&server, "dup@x.com", "pw1", Some("learner")).await;

    let again = server
        .post("/register")
        .json(&json!({ "email": "dup@x.com", "password": "pw1", "role": "learner" }))
        .await;
    again.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn invalid_registration_is_rejected() {
    let (server, _store) = test_server().await;

    let missing_email = server
        .post("/register")
        .json(&json!({ "email": "not-an-email", "password": "pw1" }))
        .await;
    missing_email.assert_status(StatusCode::BAD_REQUEST);

    let admin_role = server
        .post("/register")
        .json(&json!({ "email": "sneaky@x.com", "password": "pw1", "role": "admin" }))
        .await;
    admin_role.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_login_requires_allow_list_membership() {
    let (server, _store) = test_server().await;

    let token = admin_token(&server).await;
    assert!(!token.is_empty());

    // Correct credentials on an account outside the allow-list are denied.
    register(&server, "notadmin@x.com", "pw1", Some("learner")).await;
    let denied = server
        .post("/admin-login")
        .json(&json!({ "email": "notadmin@x.com", "password": "pw1" }))
        .await;
    denied.assert_status(StatusCode::UNAUTHORIZED);

    let bad_password = server
        .post("/admin-login")
        .json(&json!({ "email": "admin@hyperskill.com", "password": "nope" }))
        .await;
    bad_password.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_fail_closed() {
    let (server, _store) = test_server().await;

    let anonymous = server.get("/admin/teachers").await;
    anonymous.assert_status(StatusCode::UNAUTHORIZED);

    register(&server, "learner@x.com", "pw1", Some("learner")).await;
    let auth = login(&server, "learner@x.com", "pw1").await;

    let forbidden = server
        .get("/admin/teachers")
        .add_header(AUTHORIZATION, bearer(&auth.token))
        .await;
    forbidden.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_verification_workflow() {
    let (server, _store) = test_server().await;

    register(&server, "newteacher@x.com", "pw1", Some("teacher")).await;
    let auth = login(&server, "newteacher@x.com", "pw1").await;

    let submitted = server
        .post("/teachers/register")
        .add_header(AUTHORIZATION, bearer(&auth.token))
        .json(&json!({
            "name": "Nitha Kumar",
            "age": 29,
            "qualification": "MSc Computer Science",
            "teaching_field": "Web Development",
            "subjects": ["Web Development", "Computer Science"],
            "languages": ["English", "Tamil"],
            "hourly_rate": "500",
            "availability": [{ "day": "Monday", "time": "18:00" }]
        }))
        .await;
    submitted.assert_status_ok();
    let record = submitted.json::<ApiResponse<TeacherResponse>>().data.unwrap();
    assert_eq!(record.verification_status, VerificationStatus::Pending);
    assert_eq!(record.account_id, auth.user.account_id);

    // A second submission for the same account conflicts.
    let again = server
        .post("/teachers/register")
        .add_header(AUTHORIZATION, bearer(&auth.token))
        .json(&json!({
            "name": "Nitha Kumar",
            "qualification": "MSc Computer Science",
            "teaching_field": "Web Development"
        }))
        .await;
    again.assert_status(StatusCode::CONFLICT);

    let token = admin_token(&server).await;

    let listed = server
        .get("/admin/teachers")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    listed.assert_status_ok();
    let page = listed.json::<ApiResponse<TeacherPageResponse>>().data.unwrap();
    assert_eq!(page.teachers.len(), 1);
    assert!(!page.has_more);

    let approve = server
        .post(&format!("/admin/teachers/{}/approve", record.account_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    approve.assert_status_ok();
    let approved = approve.json::<ApiResponse<TeacherResponse>>().data.unwrap();
    assert_eq!(approved.verification_status, VerificationStatus::Verified);

    let verified_list = server
        .get("/admin/teachers")
        .add_query_param("filter", "verified")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    verified_list.assert_status_ok();
    let verified_page = verified_list
        .json::<ApiResponse<TeacherPageResponse>>()
        .data
        .unwrap();
    assert!(verified_page
        .teachers
        .iter()
        .any(|t| t.account_id == record.account_id));

    // Re-transition: verified -> rejected is allowed.
    let reject = server
        .post(&format!("/admin/teachers/{}/reject", record.account_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    reject.assert_status_ok();

    let rejected_list = server
        .get("/admin/teachers")
        .add_query_param("filter", "rejected")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    let rejected_page = rejected_list
        .json::<ApiResponse<TeacherPageResponse>>()
        .data
        .unwrap();
    assert!(rejected_page
        .teachers
        .iter()
        .any(|t| t.account_id == record.account_id));

    let missing = server
        .post(&format!("/admin/teachers/{}/approve", Uuid::new_v4()))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    missing.assert_status(StatusCode::NOT_FOUND);

    // The teacher sees the outcome on their own record.
    let own = server
        .get("/teachers/me")
        .add_header(AUTHORIZATION, bearer(&auth.token))
        .await;
    own.assert_status_ok();
    let own_record = own.json::<ApiResponse<TeacherResponse>>().data.unwrap();
    assert_eq!(own_record.verification_status, VerificationStatus::Rejected);
}

#[tokio::test]
async fn stats_reflect_one_record_per_status() {
    let (server, store) = test_server().await;
    seed_teachers(
        &store,
        vec![
            seeded_teacher(0, VerificationStatus::Pending, "Math"),
            seeded_teacher(1, VerificationStatus::Verified, "Math"),
            seeded_teacher(2, VerificationStatus::Rejected, "Math"),
        ],
    )
    .await;

    let token = admin_token(&server).await;
    let response = server
        .get("/admin/teachers/stats")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();

    let stats = response.json::<ApiResponse<VerificationStats>>().data.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.verified, 1);
    assert_eq!(stats.rejected, 1);
}

#[tokio::test]
async fn fifteen_teachers_paginate_as_ten_then_five() {
    let (server, store) = test_server().await;
    seed_teachers(
        &store,
        (0..15)
            .map(|n| seeded_teacher(n, VerificationStatus::Pending, "Math"))
            .collect(),
    )
    .await;

    let token = admin_token(&server).await;

    let first = server
        .get("/admin/teachers")
        .add_query_param("sort_by", "name")
        .add_query_param("sort_dir", "asc")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    first.assert_status_ok();
    let first_page = first.json::<ApiResponse<TeacherPageResponse>>().data.unwrap();
    assert_eq!(first_page.teachers.len(), 10);
    assert!(first_page.has_more);
    let cursor = first_page.next_cursor.clone().expect("cursor for page two");

    let names: Vec<&str> = first_page.teachers.iter().map(|t| t.name.as_str()).collect();
    let mut sorted_names = names.clone();
    sorted_names.sort();
    assert_eq!(names, sorted_names);

    let second = server
        .get("/admin/teachers")
        .add_query_param("sort_by", "name")
        .add_query_param("sort_dir", "asc")
        .add_query_param("cursor", &cursor)
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    second.assert_status_ok();
    let second_page = second.json::<ApiResponse<TeacherPageResponse>>().data.unwrap();
    assert_eq!(second_page.teachers.len(), 5);
    assert!(!second_page.has_more);
    assert!(second_page.next_cursor.is_none());

    // A cursor presented with different parameters is rejected.
    let stale = server
        .get("/admin/teachers")
        .add_query_param("sort_by", "name")
        .add_query_param("sort_dir", "asc")
        .add_query_param("filter", "pending")
        .add_query_param("cursor", &cursor)
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    stale.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_search_spans_the_full_filtered_set() {
    let (server, store) = test_server().await;
    let mut records: Vec<TeacherRecord> = (0..20)
        .map(|n| seeded_teacher(n, VerificationStatus::Pending, "Math"))
        .collect();
    records[18].name = "Rustam Singh".to_string();
    records[19].teaching_field = "Rust Systems".to_string();
    seed_teachers(&store, records).await;

    let token = admin_token(&server).await;
    let response = server
        .get("/admin/teachers")
        .add_query_param("sort_by", "name")
        .add_query_param("sort_dir", "asc")
        .add_query_param("search", "rust")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();

    let page = response.json::<ApiResponse<TeacherPageResponse>>().data.unwrap();
    assert_eq!(page.teachers.len(), 2);
}

#[tokio::test]
async fn role_selection_is_one_shot() {
    let (server, _store) = test_server().await;

    register(&server, "undecided@x.com", "pw1", None).await;
    let auth = login(&server, "undecided@x.com", "pw1").await;
    assert_eq!(auth.role, None);

    let select = server
        .post("/profile/role")
        .add_header(AUTHORIZATION, bearer(&auth.token))
        .json(&json!({ "role": "learner" }))
        .await;
    select.assert_status_ok();

    let again = server
        .post("/profile/role")
        .add_header(AUTHORIZATION, bearer(&auth.token))
        .json(&json!({ "role": "teacher" }))
        .await;
    again.assert_status(StatusCode::CONFLICT);

    let auth = login(&server, "undecided@x.com", "pw1").await;
    assert_eq!(auth.role, Some(Role::Learner));
}

#[tokio::test]
async fn booking_flow_between_learner_and_teacher() {
    let (server, _store) = test_server().await;

    register(&server, "tutor@x.com", "pw1", Some("teacher")).await;
    let teacher_auth = login(&server, "tutor@x.com", "pw1").await;
    server
        .post("/teachers/register")
        .add_header(AUTHORIZATION, bearer(&teacher_auth.token))
        .json(&json!({
            "name": "Tutor One",
            "qualification": "BEd",
            "teaching_field": "Math"
        }))
        .await
        .assert_status_ok();

    register(&server, "student@x.com", "pw1", Some("learner")).await;
    let learner_auth = login(&server, "student@x.com", "pw1").await;

    let booked = server
        .post("/session-requests")
        .add_header(AUTHORIZATION, bearer(&learner_auth.token))
        .json(&json!({
            "teacher_id": teacher_auth.user.account_id,
            "date": "2024-06-01",
            "time": "18:30",
            "topic": "Linear algebra"
        }))
        .await;
    booked.assert_status_ok();
    let request = booked
        .json::<ApiResponse<SessionRequestResponse>>()
        .data
        .unwrap();
    assert_eq!(request.status, "pending");
    assert_eq!(request.learner_email, "student@x.com");

    let mine = server
        .get("/session-requests/mine")
        .add_header(AUTHORIZATION, bearer(&learner_auth.token))
        .await;
    mine.assert_status_ok();
    let my_requests = mine
        .json::<ApiResponse<Vec<SessionRequestResponse>>>()
        .data
        .unwrap();
    assert_eq!(my_requests.len(), 1);

    let incoming = server
        .get("/session-requests/incoming")
        .add_header(AUTHORIZATION, bearer(&teacher_auth.token))
        .await;
    incoming.assert_status_ok();
    let inbox = incoming
        .json::<ApiResponse<Vec<SessionRequestResponse>>>()
        .data
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].request_id, request.request_id);

    let unknown_teacher = server
        .post("/session-requests")
        .add_header(AUTHORIZATION, bearer(&learner_auth.token))
        .json(&json!({
            "teacher_id": Uuid::new_v4(),
            "date": "2024-06-01",
            "time": "18:30"
        }))
        .await;
    unknown_teacher.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn browse_lists_only_verified_teachers() {
    let (server, store) = test_server().await;
    let mut verified = seeded_teacher(0, VerificationStatus::Verified, "Web Development");
    verified.name = "Visible Teacher".to_string();
    seed_teachers(
        &store,
        vec![
            verified,
            seeded_teacher(1, VerificationStatus::Pending, "Web Development"),
        ],
    )
    .await;

    let response = server
        .get("/teachers")
        .add_query_param("field", "Web Development")
        .await;
    response.assert_status_ok();
    let teachers = response
        .json::<ApiResponse<Vec<TeacherResponse>>>()
        .data
        .unwrap();
    assert_eq!(teachers.len(), 1);
    assert_eq!(teachers[0].name, "Visible Teacher");

    let no_field = server.get("/teachers").await;
    no_field.assert_status_ok();
    assert!(no_field
        .json::<ApiResponse<Vec<TeacherResponse>>>()
        .data
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn catalog_is_listed_ordered_by_name() {
    let (server, store) = test_server().await;
    store
        .seed_catalog(
            vec![
                LearningCategory {
                    category_id: Uuid::new_v4(),
                    name: "Technology".to_string(),
                    description: None,
                    teacher_count: 0,
                },
                LearningCategory {
                    category_id: Uuid::new_v4(),
                    name: "Arts".to_string(),
                    description: None,
                    teacher_count: 0,
                },
            ],
            vec![
                LearningField {
                    field_id: Uuid::new_v4(),
                    name: "Web Development".to_string(),
                    description: None,
                    teacher_count: 0,
                },
                LearningField {
                    field_id: Uuid::new_v4(),
                    name: "Math".to_string(),
                    description: None,
                    teacher_count: 0,
                },
            ],
        )
        .unwrap();

    let categories = server.get("/catalog/categories").await;
    categories.assert_status_ok();
    let listed = categories
        .json::<ApiResponse<Vec<LearningCategory>>>()
        .data
        .unwrap();
    let names: Vec<&str> = listed.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Arts", "Technology"]);

    let fields = server.get("/catalog/fields").await;
    fields.assert_status_ok();
    let listed = fields
        .json::<ApiResponse<Vec<LearningField>>>()
        .data
        .unwrap();
    let names: Vec<&str> = listed.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Math", "Web Development"]);
}
