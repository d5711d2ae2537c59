//! Shared helpers for end-to-end API tests.
//!
//! Each test builds its own router over a fresh in-memory database and
//! drives it in-process with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use taskify::api::{AppState, create_router};
use taskify::infrastructure::{AuthConfig, Repositories, TokenService};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_PASSWORD: &str = "password123";

/// A router plus the token service it validates with.
pub struct TestApp {
    pub router: Router,
    pub tokens: TokenService,
}

/// A registered and logged-in user.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let auth = AuthConfig::new(TEST_SECRET)
            .with_bcrypt_cost(4)
            .with_token_ttl(Duration::from_secs(3600));
        let tokens = TokenService::new(&auth.jwt_secret, auth.token_ttl);
        let router = create_router(AppState::new(Repositories::in_memory(), &auth));
        Self { router, tokens }
    }

    /// Sends a request and returns the status with the parsed JSON body.
    ///
    /// An empty body is returned as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn register(&self, name: &str, email: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"name": name, "email": email, "password": TEST_PASSWORD})),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": email, "password": password})),
        )
        .await
    }

    /// Registers and logs in a user.
    pub async fn user(&self, name: &str, email: &str) -> TestUser {
        let (status, registered) = self.register(name, email).await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {registered}");

        let (status, logged_in) = self.login(email, TEST_PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {logged_in}");

        TestUser {
            id: registered["user"]["id"].as_str().unwrap().to_string(),
            email: email.to_string(),
            token: logged_in["token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a project owned by `user` and returns its JSON.
    pub async fn project(&self, user: &TestUser, name: &str) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/projects",
                Some(&user.token),
                Some(json!({
                    "name": name,
                    "description": format!("{name} description"),
                    "created_by": user.id,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {body}");
        body["project"].clone()
    }

    /// Creates a task in `project_id` and returns its JSON.
    pub async fn task(&self, user: &TestUser, project_id: &str, title: &str) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                &tasks_uri(project_id),
                Some(&user.token),
                Some(json!({"title": title, "status": "todo", "deadline": "2024-12-31"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create task failed: {body}");
        body["task"].clone()
    }
}

pub fn project_uri(project_id: &str) -> String {
    format!("/api/projects/detail/{project_id}")
}

pub fn tasks_uri(project_id: &str) -> String {
    format!("/api/projects/{project_id}/tasks")
}

pub fn task_uri(project_id: &str, task_id: &str) -> String {
    format!("/api/projects/{project_id}/tasks/{task_id}")
}

pub fn id_of(resource: &Value) -> String {
    resource["id"].as_str().unwrap().to_string()
}
