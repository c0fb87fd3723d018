/// Common test utilities for API tests
///
/// Routers are built over a fresh [`MemoryStore`], so tests need no database
/// and can inspect queued notifications directly.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use boards_api::app::{build_router, AppState};
use boards_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, SignupConfig};
use boards_shared::models::notification::NotificationKind;
use boards_shared::store::memory::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const PASSWORD: &str = "Sup3r$ecret";

/// Test context holding the router and its backing store
pub struct TestContext {
    pub store: MemoryStore,
    pub app: axum::Router,
}

pub fn test_config(allow_open_signup: bool, production: bool) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            expiration_hours: 1,
        },
        signup: SignupConfig {
            allow_open_signup,
            ..SignupConfig::default()
        },
    }
}

impl TestContext {
    /// Open signup enabled
    pub fn new() -> Self {
        Self::with_config(test_config(true, false))
    }

    pub fn with_config(config: Config) -> Self {
        let store = MemoryStore::new();
        let state = AppState::new(Arc::new(store.clone()), config);

        Self {
            store,
            app: build_router(state),
        }
    }

    /// Sends a request and returns the status with the decoded JSON body
    ///
    /// Empty bodies decode to `Value::Null`.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(body) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    /// Signs a user up through the API and returns the session response
    pub async fn signup(&self, username: &str, email: &str) -> Value {
        let (status, body) = self
            .send(
                "POST",
                "/v1/auth/signup",
                None,
                Some(json!({
                    "username": username,
                    "email": email,
                    "password": PASSWORD,
                    "account_logo_color": "#4a90e2"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);

        body
    }

    /// Token carried by the latest queued notification of `kind`
    pub async fn last_token(&self, kind: NotificationKind) -> String {
        self.store
            .notifications()
            .await
            .iter()
            .rev()
            .find(|n| n.kind == kind)
            .and_then(|n| n.payload["token"].as_str().map(String::from))
            .expect("notification with token")
    }
}

pub fn token(session: &Value) -> &str {
    session["token"].as_str().expect("session token")
}

pub fn account_id(session: &Value) -> &str {
    session["accounts"][0]["id"].as_str().expect("account id")
}
