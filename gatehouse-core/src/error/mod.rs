pub mod utilities;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password. The two cases are never distinguished.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Client address blocked until {until}")]
    Blocked { until: DateTime<Utc> },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    /// The store could not be reached at all (pool timeout, closed pool, I/O).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    /// Several form fields failed at once; each carries its own message.
    #[error("{0}")]
    Fields(crate::validation::FieldErrors),
}

impl Error {
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// True when the backing store could not be reached.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Error::Storage(StorageError::Unavailable(_)))
    }

    /// The end of the lockout window when this error is a block rejection.
    pub fn blocked_until(&self) -> Option<DateTime<Utc>> {
        match self {
            Error::Auth(AuthError::Blocked { until }) => Some(*until),
            _ => None,
        }
    }
}
