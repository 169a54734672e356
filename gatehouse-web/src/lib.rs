//! # Gatehouse web application
//!
//! Server-rendered login, registration and role dashboards on top of [`gatehouse_core`].
//!
//! | Route              | Methods    | Access                                   |
//! | ------------------ | ---------- | ---------------------------------------- |
//! | `/`                | GET        | Redirects to `/login` or the dashboard   |
//! | `/login`           | GET, POST  | Anonymous; POST is CSRF checked          |
//! | `/register`        | GET, POST  | Anonymous; POST is CSRF checked          |
//! | `/dashboard`       | GET        | Role `user`                              |
//! | `/admin/dashboard` | GET        | Role `admin`                             |
//! | `/logout`          | GET        | Anyone                                   |
//! | `/health`          | GET        | Anyone; JSON                             |
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gatehouse_core::Gatehouse;
//! use gatehouse_storage_sqlite::{SqliteRepositoryProvider, connect};
//! use gatehouse_web::{AppState, WebConfig, create_router};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let pool = connect("sqlite://gatehouse.db", std::time::Duration::from_secs(5)).await?;
//! let gatehouse = Gatehouse::new(Arc::new(SqliteRepositoryProvider::new(pool)));
//! gatehouse.migrate().await?;
//!
//! let app = create_router(AppState::new(Arc::new(gatehouse), WebConfig::default()));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(
//!     listener,
//!     app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```
pub mod config;
mod csrf;
mod error;
mod extractors;
mod middleware;
mod routes;
mod templates;
mod types;

pub use error::{Result, UNAVAILABLE_MESSAGE, WebError};
pub use extractors::{
    AdminUser, ClientContext, CurrentUser, OptionalUser, RegularUser, SessionTokenFromCookie,
};
pub use middleware::{AppState, session_middleware};
pub use routes::{
    BLOCKED_MESSAGE, INVALID_CREDENTIALS_MESSAGE, MISSING_CREDENTIALS_MESSAGE, REGISTERED_MESSAGE,
    create_router,
};
pub use types::{
    CookieConfig, CookieSameSite, HealthResponse, LoginForm, LoginQuery, RegisterForm, WebConfig,
};
