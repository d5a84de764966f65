/// Common test utilities for HTTP tests
///
/// Builds the full router over an in-memory store and offers helpers for
/// registering users and sending JSON requests through `oneshot`.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use teamboard_api::{
    app::{build_router, AppState},
    config::{ApiConfig, Config, DatabaseConfig, JwtConfig, ProjectsConfig},
};
use teamboard_shared::store::memory::MemoryStore;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "api-test-secret-key-at-least-32-bytes";
pub const TEST_PASSWORD: &str = "Password123";

/// A registered user and their access token
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
    pub refresh_token: String,
}

/// Router plus the store it runs on
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
}

pub fn test_config(delete_cascade: bool) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
        projects: ProjectsConfig { delete_cascade },
    }
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_cascade(false)
    }

    pub fn with_cascade(delete_cascade: bool) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), test_config(delete_cascade));

        Self {
            app: build_router(state),
            store,
        }
    }

    /// Sends a request and returns the status with the parsed JSON body
    ///
    /// An empty body comes back as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers a user through `/auth/register`
    pub async fn register(&self, name: &str) -> TestUser {
        let email = format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4());
        let (status, body) = self
            .send(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": TEST_PASSWORD,
                    "name": name,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        TestUser {
            id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            email,
            token: body["access_token"].as_str().unwrap().to_string(),
            refresh_token: body["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a project owned by `owner` and returns its id
    pub async fn create_project(&self, owner: &TestUser, name: &str) -> Uuid {
        let (status, body) = self
            .post(
                "/projects",
                &owner.token,
                json!({ "name": name, "description": format!("{} description", name) }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {}", body);

        body["project"]["id"].as_str().unwrap().parse().unwrap()
    }

    /// Adds `user` to `project_id` with `role`, acting as `admin`
    pub async fn add_member(&self, admin: &TestUser, project_id: Uuid, user: &TestUser, role: &str) {
        let (status, body) = self
            .post(
                "/project-users",
                &admin.token,
                json!({ "project_id": project_id, "user_id": user.id, "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add member failed: {}", body);
    }

    /// Creates a task in `project_id` assigned to `assignee`
    pub async fn create_task(&self, author: &TestUser, project_id: Uuid, assignee: Uuid, title: &str) -> Uuid {
        let (status, body) = self
            .post(
                "/tasks",
                &author.token,
                json!({
                    "title": title,
                    "description": format!("{} description", title),
                    "project_id": project_id,
                    "assigned_to": assignee,
                    "due_at": "2026-12-31T17:00:00Z",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create task failed: {}", body);

        body["task"]["id"].as_str().unwrap().parse().unwrap()
    }
}
