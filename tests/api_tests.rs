// tests/api_tests.rs

use serde_json::{Value, json};
use thpt_exam::{config::Config, database, routes, state::AppState};

const ADMIN_USERNAME: &str = "quantri";
const ADMIN_PASSWORD: &str = "quantri123";

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    let pool = database::connect_in_memory()
        .await
        .expect("Failed to open in-memory database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        server_address: "127.0.0.1:0".to_string(),
        exam_duration_seconds: 600,
        tick_interval_ms: 1000,
        admin_username: Some(ADMIN_USERNAME.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
    };

    database::seed_admin_user(&pool, &config)
        .await
        .expect("Failed to seed admin");

    let app = routes::create_router(AppState::new(pool, config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

async fn login(client: &reqwest::Client, address: &str, username: &str, password: &str) -> String {
    let resp: Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    resp["token"].as_str().expect("Token not found").to_string()
}

#[tokio::test]
async fn unknown_path_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_then_login() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "username": "hocsinh", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["role"], "student");
    assert!(user.get("password").is_none());

    let token = login(&client, &address, "hocsinh", "password123").await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn register_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "username": "yo", "password": "password123" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let body = json!({ "username": "trung_ten", "password": "password123" });

    let first = client
        .post(format!("{}/api/auth/register", address))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = client
        .post(format!("{}/api/auth/register", address))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "username": ADMIN_USERNAME, "password": "nope1234" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn admin_routes_require_admin_role() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let body = json!({ "name": "Toán", "slug": "toan" });

    let anonymous = client
        .post(format!("{}/api/admin/subjects", address))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);

    client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "username": "hocsinh", "password": "password123" }))
        .send()
        .await
        .unwrap();
    let student = login(&client, &address, "hocsinh", "password123").await;

    let forbidden = client
        .post(format!("{}/api/admin/subjects", address))
        .bearer_auth(&student)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);
}

#[tokio::test]
async fn catalog_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &address, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    // 1. Subject
    let subject: Value = client
        .post(format!("{}/api/admin/subjects", address))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Vật lý", "slug": "vat-ly", "description": "Đề thi THPT môn Vật lý" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let subject_id = subject["id"].as_i64().unwrap();

    // 2. Exam without a duration takes the configured default
    let exam: Value = client
        .post(format!("{}/api/admin/exams", address))
        .bearer_auth(&admin)
        .json(&json!({ "subject_id": subject_id, "title": "Đề minh họa 2025" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let exam_id = exam["id"].as_i64().unwrap();
    assert_eq!(exam["duration_seconds"], 600);

    // 3. Questions; the answer must be one of the options
    let rejected = client
        .post(format!("{}/api/admin/questions", address))
        .bearer_auth(&admin)
        .json(&json!({
            "exam_id": exam_id,
            "content": "Đơn vị của lực là gì?",
            "options": ["Joule", "Newton"],
            "answer": "Watt"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status().as_u16(), 400);

    let created = client
        .post(format!("{}/api/admin/questions", address))
        .bearer_auth(&admin)
        .json(&json!({
            "exam_id": exam_id,
            "content": "Đơn vị của lực là gì?<script>alert(1)</script>",
            "options": ["Joule", "Newton"],
            "answer": "Newton",
            "analysis": "F = m.a"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);

    // 4. Public reads
    let subjects: Vec<Value> = client
        .get(format!("{}/api/subjects", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0]["slug"], "vat-ly");

    let exams: Vec<Value> = client
        .get(format!("{}/api/subjects/{}/exams", address, subject_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(exams.len(), 1);

    let detail: Value = client
        .get(format!("{}/api/exams/{}", address, exam_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["title"], "Đề minh họa 2025");
    let questions = detail["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0]["content"], "Đơn vị của lực là gì?");
    assert!(questions[0].get("answer").is_none());

    // 5. Missing resources
    let missing = client
        .get(format!("{}/api/subjects/9999/exams", address))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);

    let question_id = questions[0]["id"].as_i64().unwrap();
    let deleted = client
        .delete(format!("{}/api/admin/questions/{}", address, question_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);

    let deleted_again = client
        .delete(format!("{}/api/admin/questions/{}", address, question_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted_again.status().as_u16(), 404);
}

#[tokio::test]
async fn duplicate_subject_slug_conflicts() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &address, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let body = json!({ "name": "Toán", "slug": "toan" });

    for expected in [201, 409] {
        let response = client
            .post(format!("{}/api/admin/subjects", address))
            .bearer_auth(&admin)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), expected);
    }
}
