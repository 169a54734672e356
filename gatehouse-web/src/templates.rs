use askama::Template;
use axum::response::Html;
use chrono::{DateTime, Utc};
use gatehouse_core::{
    BlockStatus, LoginAttemptRecord, LoginLogEntry, RecentLogin, validation::FieldErrors,
};

use crate::error::Result;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_time(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Render a template into an HTML body.
pub fn render<T: Template>(template: &T) -> Result<Html<String>> {
    Ok(Html(template.render()?))
}

#[derive(Template, Default)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub csrf_token: String,
    pub username: String,
    pub error: Option<String>,
    pub notice: Option<String>,
}

#[derive(Template, Default)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub csrf_token: String,
    pub username: String,
    pub role: String,
    pub errors: FieldErrors,
    /// Form-wide failure not tied to a field.
    pub error: Option<String>,
}

pub struct LoginRow {
    pub ip_address: String,
    pub login_time: String,
}

impl From<&LoginLogEntry> for LoginRow {
    fn from(entry: &LoginLogEntry) -> Self {
        Self {
            ip_address: entry.ip_address.clone(),
            login_time: format_time(entry.login_time),
        }
    }
}

pub struct RecentLoginRow {
    pub username: String,
    pub role: String,
    pub ip_address: String,
    pub login_time: String,
}

impl From<&RecentLogin> for RecentLoginRow {
    fn from(login: &RecentLogin) -> Self {
        Self {
            username: login.username.clone(),
            role: login.role.to_string(),
            ip_address: login.ip_address.clone(),
            login_time: format_time(login.login_time),
        }
    }
}

/// Failure counter of the viewer's address as shown on both dashboards.
pub struct AttemptRow {
    pub failed_attempts: u32,
    pub last_failed_attempt: String,
    pub status: &'static str,
}

impl AttemptRow {
    pub fn new(record: &LoginAttemptRecord, now: DateTime<Utc>) -> Self {
        let status = match record.status_at(now) {
            BlockStatus::Blocked { .. } => "Blocked",
            BlockStatus::NotBlocked => "Failed",
        };
        Self {
            failed_attempts: record.failed_attempts,
            last_failed_attempt: format_time(record.last_failed_attempt),
            status,
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub username: String,
    pub client_ip: String,
    pub history: Vec<LoginRow>,
    pub attempt: Option<AttemptRow>,
}

#[derive(Template)]
#[template(path = "admin_dashboard.html")]
pub struct AdminDashboardTemplate {
    pub username: String,
    pub client_ip: String,
    pub recent_logins: Vec<RecentLoginRow>,
    pub attempt: Option<AttemptRow>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub message: &'static str,
}
