//! In-process test harness: the full router over the in-memory store, driven
//! with `tower::ServiceExt::oneshot`. Each `TestClient` keeps its own session
//! cookie, so several clients act as several browsers.

#![allow(dead_code)]

pub mod faulty;

use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use course_market_core::ports::{DatabaseService, SessionStore};
use faulty::FaultyStore;
use marketplace_lib::{
    adapters::MemoryStore,
    config::Config,
    web::{router, AppState},
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_ports(store.clone(), store.clone(), store)
    }

    /// An app whose store can be told to fail. `store` still reads the same data.
    pub fn faulty() -> (Self, Arc<FaultyStore>) {
        let store = Arc::new(MemoryStore::new());
        let faults = Arc::new(FaultyStore::new(store.clone()));
        let app = Self::with_ports(faults.clone(), faults.clone(), store);
        (app, faults)
    }

    fn with_ports(
        db: Arc<dyn DatabaseService>,
        sessions: Arc<dyn SessionStore>,
        store: Arc<MemoryStore>,
    ) -> Self {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://unused".to_string()),
            "COOKIE_SECURE" => Some("false".to_string()),
            _ => None,
        })
        .unwrap();
        let state = Arc::new(AppState::new(db, sessions, Arc::new(config)));
        Self {
            router: router(state.clone()),
            state,
            store,
        }
    }

    /// A fresh browser with no cookies.
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookie: None,
        }
    }
}

pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    async fn send(&mut self, method: Method, path: &str, form: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match form {
            Some(form) => {
                builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };
        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }
        response
    }

    /// The id in the session cookie this client currently holds.
    pub fn session_id(&self) -> Option<&str> {
        self.cookie.as_deref()?.strip_prefix("session=")
    }

    pub async fn get(&mut self, path: &str) -> Response<Body> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&mut self, path: &str, form: &str) -> Response<Body> {
        self.send(Method::POST, path, Some(form)).await
    }

    /// GETs a view and decodes its JSON body.
    pub async fn view(&mut self, path: &str) -> Value {
        let response = self.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {} did not render", path);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// The flash messages shown by the view at `path`.
    pub async fn flashes(&mut self, path: &str) -> Vec<String> {
        let view = self.view(path).await;
        serde_json::from_value(view["flashes"].clone()).unwrap()
    }

    pub async fn register(&mut self, username: &str, password: &str, email: &str) -> Response<Body> {
        let form = format!("username={}&password={}&email={}", username, password, email);
        self.post("/register", &form).await
    }

    pub async fn login(&mut self, identifier: &str, password: &str) -> Response<Body> {
        let form = format!("email_or_username={}&password={}", identifier, password);
        self.post("/login", &form).await
    }

    /// Registers and logs in, asserting both succeed.
    pub async fn sign_up(&mut self, username: &str, email: &str) {
        let response = self.register(username, "pw123", email).await;
        assert_eq!(location(&response), "/login");
        let response = self.login(username, "pw123").await;
        assert_eq!(location(&response), "/");
        self.flashes("/").await;
    }

    /// Creates a course and returns its id, read back from the home view.
    pub async fn create_course(&mut self, title: &str, description: &str, price: &str) -> i64 {
        let form = format!("title={}&description={}&price={}", title, description, price);
        let response = self.post("/create_course", &form).await;
        assert_eq!(location(&response), "/");
        let home = self.view("/").await;
        let title = title.replace('+', " ");
        home["courses"]
            .as_array()
            .unwrap()
            .iter()
            .rev()
            .find(|c| c["title"] == title.as_str())
            .and_then(|c| c["id"].as_i64())
            .unwrap()
    }
}

/// The redirect target of a `303 See Other` response.
pub fn location(response: &Response<Body>) -> &str {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}
