use axum_extra::extract::cookie::SameSite;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub user_type: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginQuery {
    pub registered: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub csrf_name: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: CookieSameSite,
    pub path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "session_id".to_string(),
            csrf_name: "csrf_token".to_string(),
            http_only: true,
            secure: true,
            same_site: CookieSameSite::Lax,
            path: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub enum CookieSameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl From<CookieSameSite> for SameSite {
    fn from(value: CookieSameSite) -> Self {
        match value {
            CookieSameSite::Strict => SameSite::Strict,
            CookieSameSite::Lax => SameSite::Lax,
            CookieSameSite::None => SameSite::None,
        }
    }
}

impl CookieConfig {
    /// Same as the default but without the `Secure` flag, for plain HTTP on localhost.
    pub fn development() -> Self {
        Self {
            secure: false,
            ..Self::default()
        }
    }
}

/// Settings of the HTTP layer.
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub cookie: CookieConfig,
    /// Take the client address from the first `X-Forwarded-For` entry.
    pub trust_forwarded_for: bool,
    /// Rows in the admin dashboard's recent login table.
    pub recent_logins_limit: u32,
    /// Rows in the user dashboard's login history.
    pub history_limit: u32,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cookie: CookieConfig::default(),
            trust_forwarded_for: false,
            recent_logins_limit: 10,
            history_limit: 20,
        }
    }
}
