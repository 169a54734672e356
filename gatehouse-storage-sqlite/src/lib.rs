//! SQLite storage backend
//!
//! Implements every repository trait of `gatehouse-core` on a single [`SqlitePool`].
//! Timestamps are stored as unix milliseconds.
//!
//! ```rust,no_run
//! use gatehouse_storage_sqlite::{SqliteRepositoryProvider, connect};
//! use gatehouse_core::RepositoryProvider;
//!
//! # async fn run() -> Result<(), gatehouse_core::Error> {
//! let pool = connect("sqlite://gatehouse.db", std::time::Duration::from_secs(5)).await?;
//! let repositories = SqliteRepositoryProvider::new(pool);
//! repositories.migrate().await?;
//! # Ok(())
//! # }
//! ```
mod migrations;
mod repositories;

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gatehouse_core::{Error, error::StorageError};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub use migrations::SqliteMigrationManager;
pub use repositories::{
    SqliteLoginAttemptRepository, SqliteLoginLogRepository, SqliteRepositoryProvider,
    SqliteSessionRepository, SqliteUserRepository,
};

/// Open a pool on `database_url`, creating the database file if needed.
///
/// `acquire_timeout` bounds how long a request waits for a connection before the
/// operation fails with [`StorageError::Unavailable`].
pub async fn connect(database_url: &str, acquire_timeout: Duration) -> Result<SqlitePool, Error> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| {
            tracing::error!(error = %e, "Invalid database URL");
            StorageError::Database(format!("Invalid database URL: {e}"))
        })?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(acquire_timeout);

    SqlitePoolOptions::new()
        .acquire_timeout(acquire_timeout)
        .connect_with(options)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to open database").into())
}

/// Classify a sqlx error.
///
/// Connection level failures become [`StorageError::Unavailable`], unique violations
/// [`StorageError::Constraint`], everything else [`StorageError::Database`].
pub(crate) fn map_sqlx_error(error: sqlx::Error, context: &str) -> StorageError {
    tracing::error!(error = %error, "{context}");
    match error {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StorageError::Unavailable(context.to_string())
        }
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StorageError::Constraint(db.message().to_string())
        }
        _ => StorageError::Database(context.to_string()),
    }
}

pub(crate) fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
