#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use devconnector_api::app::{router, AppState};
use devconnector_api::auth::TokenAuthenticator;
use devconnector_api::config::AppConfig;
use devconnector_api::models::User;
use devconnector_api::store::{MemoryStore, Repository};

pub const TEST_SECRET: &str = "integration-test-secret";

/// The real server binary on a free port, backed by the in-memory store.
/// Each test owns its server; dropping it kills and reaps the process.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let server = Self::spawn()?;
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Null stdio: an inherited pipe would keep a piped test run open.
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_devconnector-api"));
        cmd.env("DEVCONNECTOR_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("JWT_SECRET", TEST_SECRET)
            .env_remove("DATABASE_URL")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// In-process router over a fresh memory store. Requests go through the full
/// middleware stack via `oneshot`.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub authenticator: Arc<TokenAuthenticator>,
}

impl TestApp {
    pub fn new() -> Self {
        let mut config = AppConfig::development();
        config.security.jwt_secret = TEST_SECRET.to_string();
        config.api.enable_request_logging = false;

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config, store.clone());
        Self {
            authenticator: Arc::clone(&state.authenticator),
            router: router(state),
            store,
        }
    }

    /// Store a user and return it with a valid token.
    pub async fn user(&self, name: &str) -> (User, String) {
        let user = User::new(name, format!("{}@example.com", name.to_lowercase()), None);
        Repository::<User>::new(self.store.clone())
            .save(&user)
            .await
            .expect("seed user");
        let token = self.authenticator.issue(user.id).expect("issue token");
        (user, token)
    }

    /// Store a user whose password hash will pass a real login.
    pub async fn user_with_password(&self, name: &str, password: &str) -> User {
        let hash = bcrypt::hash(password, 4).expect("hash password");
        let user = User::new(name, format!("{}@example.com", name.to_lowercase()), Some(hash));
        Repository::<User>::new(self.store.clone())
            .save(&user)
            .await
            .expect("seed user");
        user
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }

    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("x-auth-token", token);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, Some(token), body).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, Some(token), None).await
    }
}
