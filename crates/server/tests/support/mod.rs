#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use configs::{AppConfig, StorageBackend};
use server::routes;
use server::state::AppState;
use service::storage::memory::InMemoryStore;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const PASSWORD: &str = "S3curePass!";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
}

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.database.backend = StorageBackend::Memory;
    cfg.auth.admin_emails = vec![ADMIN_EMAIL.to_string()];
    cfg
}

pub fn build_app() -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    let state = AppState::in_memory(store.clone(), &test_config());
    let router = routes::build_router(state, tower_http::cors::CorsLayer::very_permissive());
    TestApp { router, store }
}

pub struct Reply {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

impl TestApp {
    pub async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::COOKIE, format!("session_token={t}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        self.call(req).await
    }

    pub async fn call(&self, req: Request<Body>) -> Reply {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let set_cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Reply { status, set_cookie, body }
    }

    /// Register and log in; returns the session token.
    pub async fn login_as(&self, email: &str, name: &str) -> String {
        let r = self
            .send("POST", "/auth/register", None, Some(json!({ "email": email, "name": name, "password": PASSWORD })))
            .await;
        assert_eq!(r.status, StatusCode::OK, "register failed: {}", r.body);
        let r = self
            .send("POST", "/auth/login", None, Some(json!({ "email": email, "password": PASSWORD })))
            .await;
        assert_eq!(r.status, StatusCode::OK, "login failed: {}", r.body);
        r.body["token"].as_str().unwrap().to_string()
    }

    pub async fn create_anketa(&self, token: &str, title: &str, category_id: &str, city_id: &str) -> Reply {
        self.send(
            "POST",
            "/api/anketas",
            Some(token),
            Some(json!({
                "title": title,
                "description": "Fast and tidy",
                "categoryId": category_id,
                "cityId": city_id,
                "telegram": "@master_ivan",
            })),
        )
        .await
    }
}
