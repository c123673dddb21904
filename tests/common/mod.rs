use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use tailtrack::config::{Config, MailConfig};
use tailtrack::db::Database;
use tailtrack::email::{Mailer, OutgoingEmail};

/// Captures outgoing mail instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// The `token=` value from the most recent reset link sent to `to`.
    pub fn last_reset_token(&self, to: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|email| email.to == to)
            .and_then(|email| {
                email
                    .text
                    .split("token=")
                    .nth(1)
                    .map(|rest| rest.split_whitespace().next().unwrap_or("").to_string())
            })
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), String> {
        if self.fail {
            return Err("smtp relay unavailable".to_string());
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
    pub mailer: Arc<RecordingMailer>,
}

/// A registered user: id, token and household.
pub struct TestUser {
    pub id: i64,
    pub token: String,
    pub household_id: i64,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn register(&self, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(body)
            .send()
            .await
            .expect("register request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Register a user who creates their own household.
    pub async fn register_creator(&self, email: &str, username: &str) -> TestUser {
        let (body, status) = self
            .register(&json!({
                "email": email,
                "username": username,
                "password": "password123",
                "householdChoice": "create",
            }))
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        test_user(&body)
    }

    /// Register a user who joins the household behind `invite_code`.
    pub async fn register_joiner(&self, email: &str, username: &str, invite_code: &str) -> TestUser {
        let (body, status) = self
            .register(&json!({
                "email": email,
                "username": username,
                "password": "password123",
                "householdChoice": "join",
                "inviteCode": invite_code,
            }))
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        test_user(&body)
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn invite_code(&self, user: &TestUser) -> String {
        let (body, status) = self
            .get_auth(&format!("/api/households/{}", user.household_id), &user.token)
            .await;
        assert_eq!(status, StatusCode::OK, "get household failed: {body}");
        body["household"]["inviteCode"].as_str().unwrap().to_string()
    }

    /// Create a pet in the user's household, return its id.
    pub async fn create_pet(&self, user: &TestUser, name: &str, pet_type: &str) -> i64 {
        let (body, status) = self
            .post_auth(
                "/api/pets",
                &user.token,
                &json!({ "name": name, "petType": pet_type }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create pet failed: {body}");
        body["pet"]["id"].as_i64().unwrap()
    }

    /// Log an activity, return its id.
    pub async fn log_activity(&self, user: &TestUser, pet_ids: &[i64], action: &str) -> i64 {
        let (body, status) = self
            .post_auth(
                "/api/activities",
                &user.token,
                &json!({ "petIds": pet_ids, "action": action }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "log activity failed: {body}");
        body["activity"]["id"].as_i64().unwrap()
    }

    /// Current household id of a user, read straight from the database.
    pub async fn household_of(&self, user_id: i64) -> Option<i64> {
        sqlx::query_scalar::<_, Option<i64>>("SELECT household_id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn creator_of(&self, household_id: i64) -> Option<i64> {
        sqlx::query_scalar::<_, Option<i64>>("SELECT creator_id FROM households WHERE id = $1")
            .bind(household_id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    /// Make an authenticated GET request.
    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated POST request with JSON body.
    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated PATCH request with JSON body.
    pub async fn patch_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .patch(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("patch request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated DELETE request.
    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

fn test_user(body: &Value) -> TestUser {
    TestUser {
        id: body["user"]["id"].as_i64().unwrap(),
        token: body["accessToken"].as_str().unwrap().to_string(),
        household_id: body["user"]["householdId"].as_i64().unwrap(),
    }
}

/// Spawn a test app with a fresh temporary database and a recording mailer.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_mailer(Arc::new(RecordingMailer::default())).await
}

pub async fn spawn_app_with_mailer(mailer: Arc<RecordingMailer>) -> TestApp {
    let dyn_mailer: Arc<dyn Mailer> = mailer.clone();
    spawn(Some(dyn_mailer), mailer).await
}

/// Spawn a test app with no mail backend at all.
pub async fn spawn_app_without_mailer() -> TestApp {
    spawn(None, Arc::new(RecordingMailer::default())).await
}

async fn spawn(app_mailer: Option<Arc<dyn Mailer>>, mailer: Arc<RecordingMailer>) -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    // Create a unique test database
    let db_name = format!("tailtrack_test_{}", Uuid::now_v7().to_string().replace('-', ""));

    // Connect to default postgres DB to create test DB
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let db = Database::connect(&test_url, 5)
        .await
        .expect("Failed to connect to test database");
    db.migrate()
        .await
        .expect("Failed to run migrations on test database");
    let pool = db.pool().clone();

    let config = Config {
        database_url: test_url,
        db_max_connections: 5,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        token_ttl_hours: 1,
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        base_url: "http://localhost:5173".to_string(),
        max_body_size: 1_048_576,
        log_level: "warn".to_string(),
        mail: MailConfig::Disabled,
    };

    let (app, _state) = tailtrack::build_app_with_mailer(db, config, app_mailer);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        pool,
        client: Client::new(),
        db_name,
        mailer,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
