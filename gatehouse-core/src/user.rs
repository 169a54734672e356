//! User accounts
//!
//! Users are created once at registration and never mutated afterwards. The core user
//! struct is defined as follows:
//!
//! | Field        | Type       | Description                                        |
//! | ------------ | ---------- | -------------------------------------------------- |
//! | `id`         | `i64`      | Database-assigned identifier.                      |
//! | `username`   | `String`   | Unique login name (letters, digits, underscores).  |
//! | `role`       | `Role`     | `admin` or `user`; selects the landing dashboard.  |
//! | `created_at` | `DateTime` | The timestamp when the user registered.            |
//!
//! The password hash is deliberately not part of [`User`]; it only travels inside
//! [`UserCredentials`] on the authentication path.
use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    error::{ValidationError, utilities::RequiredFieldExt},
};

/// Database-assigned identifier of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        UserId(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account role, stored in the `user_type` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    /// Path of the dashboard a freshly authenticated user is sent to.
    pub fn landing_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::User => "/dashboard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(ValidationError::InvalidRole(other.to_string())),
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A user together with the stored password hash, as loaded for verification.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// A user that has not been persisted yet. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    pub fn builder() -> NewUserBuilder {
        NewUserBuilder::default()
    }
}

#[derive(Default)]
pub struct NewUserBuilder {
    username: Option<String>,
    password_hash: Option<String>,
    role: Option<Role>,
}

impl NewUserBuilder {
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password_hash(mut self, password_hash: impl Into<String>) -> Self {
        self.password_hash = Some(password_hash.into());
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn build(self) -> Result<NewUser, Error> {
        Ok(NewUser {
            username: self.username.require_field("Username")?,
            password_hash: self.password_hash.require_field("Password hash")?,
            role: self.role.unwrap_or(Role::User),
        })
    }
}
