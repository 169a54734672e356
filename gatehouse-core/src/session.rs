//! Server-side login sessions
//!
//! A session is created on successful login and referenced by an opaque token held in a
//! cookie. Only the SHA-256 hash of the token is persisted:
//!
//! | Field        | Type             | Description                                            |
//! | ------------ | ---------------- | ------------------------------------------------------ |
//! | `token_hash` | `String`         | Hex SHA-256 of the cookie token, primary key.          |
//! | `user_id`    | `UserId`         | The user the session authenticates.                    |
//! | `ip_address` | `String`         | The client address that logged in.                     |
//! | `user_agent` | `Option<String>` | The user agent of the client that created the session. |
//! | `created_at` | `DateTime`       | The timestamp when the session was created.            |
//! | `expires_at` | `DateTime`       | The timestamp when the session will expire.            |
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{crypto, user::UserId};

/// Opaque bearer token handed to the client. Never stored in plain form.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: &str) -> Self {
        Self(token.to_string())
    }

    /// Create a new random token with 256 bits of entropy
    pub fn new_random() -> Self {
        Self(crypto::generate_secure_token())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Hash used as the storage key
    pub fn hash(&self) -> String {
        crypto::hash_token(&self.0)
    }
}

impl From<String> for SessionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([redacted])")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token_hash: String,
    pub user_id: UserId,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Session lifetime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub expires_in: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expires_in: Duration::hours(24),
        }
    }
}
