//! Append-only history of successful logins.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::{Role, UserId};

/// One successful authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginLogEntry {
    pub id: i64,
    pub user_id: UserId,
    pub ip_address: String,
    pub login_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLoginLogEntry {
    pub user_id: UserId,
    pub ip_address: String,
    pub login_time: DateTime<Utc>,
}

/// A login joined with the account it belongs to, newest first in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentLogin {
    pub username: String,
    pub role: Role,
    pub ip_address: String,
    pub login_time: DateTime<Utc>,
}
