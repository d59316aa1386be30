use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use estetica::config::Config;

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Register a clinic + admin user, return body + status.
    pub async fn register(
        &self,
        tenant_name: &str,
        tenant_slug: &str,
        name: &str,
        email: &str,
        password: &str,
    ) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&json!({
                "tenantName": tenant_name,
                "tenantSlug": tenant_slug,
                "name": name,
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("register request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Login and return the auth response body + status.
    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Register the default test clinic, return the admin's access token.
    pub async fn bootstrap(&self) -> String {
        let (body, status) = self
            .register(
                "Bella Clinic",
                "bella-clinic",
                "Ana",
                "ana@test.com",
                "password123",
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "bootstrap register failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Create a client record, return its JSON.
    pub async fn create_client(&self, token: &str, name: &str, phone: &str) -> Value {
        let (body, status) = self
            .post_auth(
                "/api/v1/clients",
                token,
                &json!({ "name": name, "phone": phone }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create client non-200: {body}");
        body
    }

    /// Create a service, return its JSON.
    pub async fn create_service(&self, token: &str, name: &str, price_cents: i64) -> Value {
        let (body, status) = self
            .post_auth(
                "/api/v1/services",
                token,
                &json!({ "name": name, "duration_minutes": 60, "price_cents": price_cents }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create service non-200: {body}");
        body
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

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    // Create a unique test database
    let db_name = format!(
        "estetica_test_{}",
        Uuid::now_v7().to_string().replace('-', "")
    );

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

    // Connect to test DB and run migrations
    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        jwt_expires_days: 7,
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        base_url: "http://localhost:0".to_string(),
        frontend_origin: "http://localhost:5173".to_string(),
        environment: "test".to_string(),
        password_min_len: 6,
        max_body_size: 1_048_576,
        log_level: "warn".to_string(),
        smtp: None,
    };

    let app = estetica::build_app(pool.clone(), config);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
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
