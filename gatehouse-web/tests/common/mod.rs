#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Request, Response, StatusCode, header},
};
use chrono::DateTime;
use gatehouse_core::{Gatehouse, LockoutConfig, ManualClock};
use gatehouse_storage_sqlite::{SqliteRepositoryProvider, connect};
use gatehouse_web::{AppState, CookieConfig, WebConfig, create_router};
use tower::ServiceExt;

pub const CSRF: &str = "test-csrf-token";
pub const PASSWORD: &str = "secret1";

pub struct TestApp {
    pub router: Router,
    pub clock: ManualClock,
    pub gatehouse: Arc<Gatehouse<SqliteRepositoryProvider>>,
    pub repositories: Arc<SqliteRepositoryProvider>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(WebConfig {
            cookie: CookieConfig::development(),
            ..WebConfig::default()
        })
        .await
    }

    pub async fn with_config(config: WebConfig) -> Self {
        let pool = connect("sqlite::memory:", Duration::from_secs(5))
            .await
            .expect("Failed to create pool");
        let repositories = Arc::new(SqliteRepositoryProvider::new(pool));
        let gatehouse = Gatehouse::new(repositories.clone())
            .with_lockout_config(LockoutConfig::new(5, chrono::Duration::minutes(15)));
        gatehouse.migrate().await.expect("Failed to run migrations");
        let gatehouse = Arc::new(gatehouse);

        let clock = ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let state = AppState::new(gatehouse.clone(), config).with_clock(Arc::new(clock.clone()));

        Self {
            router: create_router(state),
            clock,
            gatehouse,
            repositories,
        }
    }

    pub async fn send_from(&self, ip: [u8; 4], request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .layer(MockConnectInfo(SocketAddr::from((ip, 40000))))
            .oneshot(request)
            .await
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.send_from([10, 0, 0, 1], request).await
    }

    pub async fn register(&self, username: &str, role: &str) -> Response<Body> {
        let body = form(&[
            ("username", username),
            ("password", PASSWORD),
            ("confirm_password", PASSWORD),
            ("user_type", role),
            ("csrf_token", CSRF),
        ]);
        self.send(post("/register", body)).await
    }

    pub async fn login_from(&self, ip: [u8; 4], username: &str, password: &str) -> Response<Body> {
        let body = form(&[
            ("username", username),
            ("password", password),
            ("csrf_token", CSRF),
        ]);
        self.send_from(ip, post("/login", body)).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Response<Body> {
        self.login_from([10, 0, 0, 1], username, password).await
    }

    /// Register and log in, returning the session cookie value.
    pub async fn signed_in(&self, username: &str, role: &str) -> String {
        assert_eq!(self.register(username, role).await.status(), StatusCode::FOUND);
        let response = self.login(username, PASSWORD).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        session_cookie(&response).expect("login sets a session cookie")
    }
}

pub fn form(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={}", v.replace(' ', "+")))
        .collect::<Vec<_>>()
        .join("&")
}

/// Form POST carrying a matching CSRF cookie.
pub fn post(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::COOKIE, format!("csrf_token={CSRF}"))
        .body(Body::from(body))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_session(uri: &str, session: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, format!("session_id={session}"))
        .body(Body::empty())
        .unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Value of a `Set-Cookie` header for `name`, if the response sets one.
pub fn set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&prefix))
        .map(|v| {
            v[prefix.len()..]
                .split(';')
                .next()
                .unwrap_or_default()
                .to_string()
        })
}

pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    set_cookie(response, "session_id").filter(|v| !v.is_empty())
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
